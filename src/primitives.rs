use serde::Serialize;

use crate::geom::Point;

/// How a path reaches a point from the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PathControl {
    Straight,
    Quadratic { cx: f32, cy: f32 },
    Cubic { c1x: f32, c1y: f32, c2x: f32, c2y: f32 },
}

/// Device-independent drawing instruction. Colours are CSS colour
/// strings; `None` for an edge or fill means it is not painted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        thickness: f32,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        edge: Option<String>,
        fill: Option<String>,
        thickness: f32,
    },
    Oval {
        cx: f32,
        cy: f32,
        rw: f32,
        rh: f32,
        edge: Option<String>,
        fill: Option<String>,
        thickness: f32,
    },
    /// `controls[i]` says how to reach `points[i]`; `controls[0]` is
    /// ignored. A closed path returns to its first point in a straight line.
    Path {
        points: Vec<Point>,
        controls: Vec<PathControl>,
        closed: bool,
        edge: Option<String>,
        fill: Option<String>,
        thickness: f32,
    },
    /// Left-aligned run with `y` on the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        bold: bool,
        color: String,
    },
}

impl Primitive {
    pub fn filled_polygon(points: Vec<Point>, color: &str) -> Self {
        let controls = vec![PathControl::Straight; points.len()];
        Primitive::Path {
            points,
            controls,
            closed: true,
            edge: None,
            fill: Some(color.to_string()),
            thickness: 0.0,
        }
    }

    pub fn filled_dot(cx: f32, cy: f32, radius: f32, color: &str) -> Self {
        Primitive::Oval {
            cx,
            cy,
            rw: radius,
            rh: radius,
            edge: None,
            fill: Some(color.to_string()),
            thickness: 0.0,
        }
    }

    pub fn stroke(x1: f32, y1: f32, x2: f32, y2: f32, color: &str, thickness: f32) -> Self {
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            color: color.to_string(),
            thickness,
        }
    }
}
