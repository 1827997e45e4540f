use crate::config::RenderConfig;
use crate::draw::Drawing;
use crate::primitives::{PathControl, Primitive};
use anyhow::Result;
use std::path::Path;

/// Serialize a drawing as a standalone SVG document. Drawings smaller than
/// the configured minimum size are centred in it.
pub fn render_svg(drawing: &Drawing, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = drawing.width.max(config.width);
    let height = drawing.height.max(config.height);
    let dx = 0.5 * (width - drawing.width);
    let dy = 0.5 * (height - drawing.height);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));
    if dx > 0.0 || dy > 0.0 {
        svg.push_str(&format!("<g transform=\"translate({dx:.2},{dy:.2})\">"));
    } else {
        svg.push_str("<g>");
    }

    for prim in &drawing.primitives {
        svg.push_str(&primitive_svg(prim, &config.font_family));
    }

    svg.push_str("</g></svg>");
    svg
}

fn paint(edge: Option<&String>, fill: Option<&String>, thickness: f32) -> String {
    let fill = fill.map(String::as_str).unwrap_or("none");
    match edge {
        Some(edge) => format!("fill=\"{fill}\" stroke=\"{edge}\" stroke-width=\"{thickness:.2}\""),
        None => format!("fill=\"{fill}\""),
    }
}

fn primitive_svg(prim: &Primitive, font_family: &str) -> String {
    match prim {
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        } => format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{color}\" stroke-width=\"{thickness:.2}\" stroke-linecap=\"round\"/>"
        ),
        Primitive::Rect {
            x,
            y,
            w,
            h,
            edge,
            fill,
            thickness,
        } => format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {}/>",
            paint(edge.as_ref(), fill.as_ref(), *thickness)
        ),
        Primitive::Oval {
            cx,
            cy,
            rw,
            rh,
            edge,
            fill,
            thickness,
        } => format!(
            "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{rw:.2}\" ry=\"{rh:.2}\" {}/>",
            paint(edge.as_ref(), fill.as_ref(), *thickness)
        ),
        Primitive::Path {
            points,
            controls,
            closed,
            edge,
            fill,
            thickness,
        } => format!(
            "<path d=\"{}\" {}/>",
            path_data(points, controls, *closed),
            paint(edge.as_ref(), fill.as_ref(), *thickness)
        ),
        Primitive::Text {
            x,
            y,
            text,
            size,
            bold,
            color,
        } => {
            let weight = if *bold { " font-weight=\"bold\"" } else { "" };
            format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{}\" font-size=\"{size:.2}\"{weight} fill=\"{color}\">{}</text>",
                escape_xml(font_family),
                escape_xml(text)
            )
        }
    }
}

fn path_data(points: &[(f32, f32)], controls: &[PathControl], closed: bool) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.0, first.1);
    for (idx, point) in points.iter().enumerate().skip(1) {
        match controls.get(idx).copied().unwrap_or(PathControl::Straight) {
            PathControl::Straight => d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1)),
            PathControl::Quadratic { cx, cy } => {
                d.push_str(&format!(" Q {cx:.2} {cy:.2} {:.2} {:.2}", point.0, point.1))
            }
            PathControl::Cubic { c1x, c1y, c2x, c2y } => d.push_str(&format!(
                " C {c1x:.2} {c1y:.2} {c2x:.2} {c2y:.2} {:.2} {:.2}",
                point.0, point.1
            )),
        }
    }
    if closed {
        d.push_str(" Z");
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = render_cfg
        .font_family
        .split(',')
        .next()
        .map(|name| name.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
