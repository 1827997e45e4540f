use crate::layout::{Arrangement, LineType, SpaceOwner};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub scale: f32,
    pub bounds: Option<[f32; 4]>,
    pub points: Vec<PointDump>,
    pub lines: Vec<LineDump>,
    pub space: Vec<SpaceDump>,
}

#[derive(Debug, Serialize)]
pub struct PointDump {
    pub atom: Option<usize>,
    pub text: Option<String>,
    pub font_size: f32,
    pub bold: bool,
    pub color: String,
    pub cx: f32,
    pub cy: f32,
    pub rw: f32,
    pub rh: f32,
}

#[derive(Debug, Serialize)]
pub struct LineDump {
    pub bond: usize,
    pub from: usize,
    pub to: usize,
    pub kind: LineType,
    pub points: [[f32; 2]; 2],
    pub size: f32,
    pub head: f32,
}

#[derive(Debug, Serialize)]
pub struct SpaceDump {
    pub owner: String,
    pub polygon: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_arrangement(layout: &Arrangement) -> Self {
        let points = layout
            .points
            .iter()
            .map(|point| PointDump {
                atom: point.anum.map(|a| a.get()),
                text: point.text.clone(),
                font_size: point.font_size,
                bold: point.bold,
                color: point.color.clone(),
                cx: point.oval.cx,
                cy: point.oval.cy,
                rw: point.oval.rw,
                rh: point.oval.rh,
            })
            .collect();

        let lines = layout
            .lines
            .iter()
            .map(|line| LineDump {
                bond: line.bnum.get(),
                from: line.bfr.get(),
                to: line.bto.get(),
                kind: line.kind,
                points: [[line.line.x1, line.line.y1], [line.line.x2, line.line.y2]],
                size: line.size,
                head: line.head,
            })
            .collect();

        let space = layout
            .space
            .entries()
            .iter()
            .map(|entry| SpaceDump {
                owner: match entry.owner {
                    SpaceOwner::Atom(a) => format!("atom:{a}"),
                    SpaceOwner::Bond(b) => format!("bond:{b}"),
                },
                polygon: entry.polygon.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            scale: layout.scale,
            bounds: layout.bounds().map(|b| [b.x, b.y, b.w, b.h]),
            points,
            lines,
            space,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Arrangement) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_arrangement(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::arrange;
    use crate::molecule::Molecule;
    use crate::text_metrics::ApproxMetrics;
    use crate::theme::RenderPolicy;

    #[test]
    fn dump_lists_points_lines_and_space() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("O", 1.5, 0.0);
        mol.add_bond(a, b, 2);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let dump = LayoutDump::from_arrangement(&layout);
        assert_eq!(dump.points.len(), 2);
        assert_eq!(dump.lines.len(), 2);
        assert!(dump.space.iter().any(|s| s.owner == "atom:2"));

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["lines"][0]["kind"], "normal");
        assert_eq!(json["points"][1]["text"], "O");
    }

    #[test]
    fn dump_writes_pretty_json() {
        let mut mol = Molecule::new();
        mol.add_atom("N", 0.0, 0.0);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let path = std::env::temp_dir().join(format!("moldraw-dump-{}.json", std::process::id()));
        write_layout_dump(&path, &layout).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(written.contains("\"points\""));
        assert!(written.contains('\n'));
    }
}
