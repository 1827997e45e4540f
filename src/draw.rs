// Primitive emitter: expands an arrangement's bond segments and glyph
// boxes into lines, ovals, paths and text runs.

use std::f32::consts::PI;

use serde::Serialize;

use crate::config::Config;
use crate::geom::{Point, line_intersect, norm};
use crate::layout::{ArrangedLine, ArrangedPoint, Arrangement, LineType};
use crate::molecule::{AtomIndex, BondType, Molecule};
use crate::primitives::{PathControl, Primitive};
use crate::theme::RenderPolicy;

const TIP_RATIO: f32 = 0.25;
const HASH_PER_UNIT: f32 = 2.5;
const HASH_PULL_IN: f32 = 0.15;
const SQUIGGLE_PER_UNIT: f32 = 3.5;
const DOT_DENSITY: f32 = 0.2;
const CLIP_MIN_ANGLE: f32 = 105.0 * PI / 180.0;
const CLIP_MAX_ANGLE: f32 = 135.0 * PI / 180.0;
const MULTI_WEDGE_SPACING: f32 = 1.5;
const MULTI_WEDGE_START: f32 = 0.2;
const SIGN_ARM: f32 = 0.4;
const SIGN_STROKE: f32 = 0.08;
const DOT_RADIUS: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub width: f32,
    pub height: f32,
    pub primitives: Vec<Primitive>,
}

/// Emit primitives for an arrangement, padded by the policy's default
/// padding.
pub fn draw_molecule(layout: &Arrangement, mol: &Molecule, policy: &RenderPolicy) -> Drawing {
    draw_molecule_padded(layout, mol, policy.default_padding * policy.point_scale)
}

/// Emit primitives using the configured padding when one is set.
pub fn draw_molecule_with_config(
    layout: &Arrangement,
    mol: &Molecule,
    config: &Config,
) -> Drawing {
    let policy = &config.policy;
    let padding = config
        .render
        .padding
        .unwrap_or(policy.default_padding * policy.point_scale);
    draw_molecule_padded(layout, mol, padding)
}

/// Emit primitives with the arrangement's bounds moved to start at
/// `(padding, padding)`.
pub fn draw_molecule_padded(layout: &Arrangement, mol: &Molecule, padding: f32) -> Drawing {
    let mut layout = layout.clone();
    let (width, height) = match layout.bounds() {
        Some(bounds) => {
            layout.offset_everything(padding - bounds.x, padding - bounds.y);
            (bounds.w + 2.0 * padding, bounds.h + 2.0 * padding)
        }
        None => (2.0 * padding, 2.0 * padding),
    };

    let mut painter = Painter {
        layout: &layout,
        mol,
        primitives: Vec::with_capacity(layout.lines.len() + layout.points.len()),
    };
    for line in &layout.lines {
        painter.draw_line(line);
    }
    for point in &layout.points {
        painter.draw_point(point);
    }
    tracing::debug!(primitives = painter.primitives.len(), width, height, "drew molecule");

    Drawing {
        width,
        height,
        primitives: painter.primitives,
    }
}

/// Leading signs, core text, trailing signs and the count of trailing dots
/// of an adjunct string such as `2+` or `-.`.
pub(crate) fn split_adjunct(text: &str) -> (&str, &str, &str, usize) {
    let body = text.trim_end_matches('.');
    let dots = text.len() - body.len();
    let is_sign = |c: char| c == '+' || c == '-';
    let core_start = body.len() - body.trim_start_matches(is_sign).len();
    let (lead, rest) = body.split_at(core_start);
    let core = rest.trim_end_matches(is_sign);
    let trail = &rest[core.len()..];
    (lead, core, trail, dots)
}

struct Painter<'a> {
    layout: &'a Arrangement,
    mol: &'a Molecule,
    primitives: Vec<Primitive>,
}

impl Painter<'_> {
    fn atom_pos(&self, atom: AtomIndex) -> Point {
        let oval = self.layout.atom_point(atom).oval;
        (oval.cx, oval.cy)
    }

    fn draw_line(&mut self, line: &ArrangedLine) {
        let l = line.line;
        match line.kind {
            LineType::Normal => {
                self.primitives
                    .push(Primitive::stroke(l.x1, l.y1, l.x2, l.y2, &line.color, line.size));
            }
            LineType::Inclined => {
                let polygon = self.wedge_polygon(line, true);
                self.primitives.push(Primitive::filled_polygon(polygon, &line.color));
            }
            LineType::Declined => self.draw_hash(line),
            LineType::Unknown => self.draw_squiggle(line),
            LineType::Dotted | LineType::DotDir => self.draw_dots(line),
            LineType::IncDouble | LineType::IncTriple | LineType::IncQuadruple => {
                self.draw_multi_wedge(line)
            }
        }
    }

    /// Narrow at `bfr`, `head` wide either side at `bto`. With `clip`, each
    /// wide corner may be pulled onto a neighbouring bond at the far atom.
    fn wedge_polygon(&self, line: &ArrangedLine, clip: bool) -> Vec<Point> {
        let l = line.line;
        let Some((dx, dy)) = l.direction() else {
            return vec![l.start(), l.end()];
        };
        let (nx, ny) = (-dy, dx);
        let tip = TIP_RATIO * line.size;
        let a = (l.x1 + nx * tip, l.y1 + ny * tip);
        let mut b = (l.x2 + nx * line.head, l.y2 + ny * line.head);
        let mut c = (l.x2 - nx * line.head, l.y2 - ny * line.head);
        let d = (l.x1 - nx * tip, l.y1 - ny * tip);

        if clip {
            for (side, neighbour) in self.clip_neighbours(line) {
                let far = self.atom_pos(line.bto);
                let limit = 3.0 * line.head;
                if side > 0.0 {
                    if let Some(p) = line_intersect(a, b, far, neighbour)
                        && norm(p.0 - l.x2, p.1 - l.y2) <= limit
                    {
                        b = p;
                    }
                } else if let Some(p) = line_intersect(d, c, far, neighbour)
                    && norm(p.0 - l.x2, p.1 - l.y2) <= limit
                {
                    c = p;
                }
            }
        }
        vec![a, b, c, d]
    }

    /// Other plain bonds at the wedge's far atom that meet it at 105-135
    /// degrees, keyed by which side of the wedge they lie on. Only applies
    /// when there are two or three such bonds and the far atom is unlabelled.
    fn clip_neighbours(&self, line: &ArrangedLine) -> Vec<(f32, Point)> {
        let far = line.bto;
        if self.layout.atom_point(far).text.is_some() {
            return Vec::new();
        }
        let (fx, fy) = self.atom_pos(far);
        let (bx, by) = self.atom_pos(line.bfr);
        let back = (by - fy).atan2(bx - fx);
        let mut found = Vec::new();
        for &bond in self.mol.atom_adj_bonds(far) {
            if bond == line.bnum || self.mol.bond(bond).kind != BondType::Normal {
                continue;
            }
            let other = self.mol.bond_other(bond, far);
            let (ox, oy) = self.atom_pos(other);
            let angle = crate::geom::angle_diff((oy - fy).atan2(ox - fx), back).abs();
            if (CLIP_MIN_ANGLE..=CLIP_MAX_ANGLE).contains(&angle) {
                let (dx, dy) = (line.line.x2 - line.line.x1, line.line.y2 - line.line.y1);
                let cross = dx * (oy - line.line.y1) - dy * (ox - line.line.x1);
                found.push((cross.signum(), (ox, oy)));
            }
        }
        if (2..=3).contains(&found.len()) {
            found
        } else {
            Vec::new()
        }
    }

    fn draw_hash(&mut self, line: &ArrangedLine) {
        let l = line.line;
        let Some((dx, dy)) = l.direction() else {
            return;
        };
        let (nx, ny) = (-dy, dx);
        let len = l.length();
        let scale = self.layout.scale;
        let mut span = len;
        let far_terminal = self.layout.atom_point(line.bto).text.is_none()
            && self.mol.atom_adj_count(line.bto) == 1;
        if far_terminal {
            span = (len - HASH_PULL_IN * scale).max(0.5 * len);
        }
        let ticks = ((len / scale * HASH_PER_UNIT).round() as usize).max(2);
        let tip = TIP_RATIO * line.size;
        for i in 0..ticks {
            let t = span * i as f32 / (ticks - 1) as f32;
            let half = tip + (line.head - tip) * (t / len);
            let (px, py) = (l.x1 + dx * t, l.y1 + dy * t);
            self.primitives.push(Primitive::stroke(
                px + nx * half,
                py + ny * half,
                px - nx * half,
                py - ny * half,
                &line.color,
                line.size,
            ));
        }
    }

    /// Closed band that wiggles along the bond: out along one set of
    /// quadratic controls, back along a slightly smaller set.
    fn draw_squiggle(&mut self, line: &ArrangedLine) {
        let l = line.line;
        let Some((dx, dy)) = l.direction() else {
            return;
        };
        let (nx, ny) = (-dy, dx);
        let len = l.length();
        let steps = ((len / self.layout.scale * SQUIGGLE_PER_UNIT).round() as usize).max(2);
        let node = |i: usize| {
            let t = len * i as f32 / steps as f32;
            (l.x1 + dx * t, l.y1 + dy * t)
        };
        let control = |i: usize, amplitude: f32| {
            let (ax, ay) = node(i - 1);
            let (bx, by) = node(i);
            let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
            PathControl::Quadratic {
                cx: 0.5 * (ax + bx) + nx * amplitude * sign,
                cy: 0.5 * (ay + by) + ny * amplitude * sign,
            }
        };

        let outer = line.head;
        let inner = (line.head - line.size).max(0.0);
        let mut points = Vec::with_capacity(2 * steps + 1);
        let mut controls = Vec::with_capacity(2 * steps + 1);
        points.push(node(0));
        controls.push(PathControl::Straight);
        for i in 1..=steps {
            points.push(node(i));
            controls.push(control(i, outer));
        }
        for i in (0..steps).rev() {
            points.push(node(i));
            // Returning from node i+1 to node i retraces segment i+1.
            controls.push(control(i + 1, inner));
        }
        self.primitives.push(Primitive::Path {
            points,
            controls,
            closed: true,
            edge: None,
            fill: Some(line.color.clone()),
            thickness: 0.0,
        });
    }

    fn draw_dots(&mut self, line: &ArrangedLine) {
        let l = line.line;
        let radius = line.size;
        let count = ((DOT_DENSITY * l.length() / radius).round() as usize).max(2);
        for i in 0..count {
            let t = i as f32 / (count - 1) as f32;
            let r = if line.kind == LineType::DotDir {
                radius * (0.5 + t)
            } else {
                radius
            };
            self.primitives.push(Primitive::filled_dot(
                l.x1 + (l.x2 - l.x1) * t,
                l.y1 + (l.y2 - l.y1) * t,
                r,
                &line.color,
            ));
        }
    }

    fn draw_multi_wedge(&mut self, line: &ArrangedLine) {
        let polygon = self.wedge_polygon(line, false);
        self.primitives.push(Primitive::filled_polygon(polygon, &line.color));

        let l = line.line;
        let Some((dx, dy)) = l.direction() else {
            return;
        };
        let (nx, ny) = (-dy, dx);
        let spacing = MULTI_WEDGE_SPACING * line.head;
        let offsets: &[f32] = match line.kind {
            LineType::IncDouble => &[1.0],
            LineType::IncTriple => &[1.0, -1.0],
            _ => &[1.5, -1.5],
        };
        let start = MULTI_WEDGE_START * l.length();
        for &k in offsets {
            let off = k * spacing;
            self.primitives.push(Primitive::stroke(
                l.x1 + dx * start + nx * off,
                l.y1 + dy * start + ny * off,
                l.x2 + nx * off,
                l.y2 + ny * off,
                &line.color,
                line.size,
            ));
        }
    }

    fn draw_point(&mut self, point: &ArrangedPoint) {
        let Some(text) = point.text.as_deref() else {
            return;
        };
        let o = point.oval;
        if point.anum.is_none() {
            let (lead, core, trail, dots) = split_adjunct(text);
            if !lead.is_empty() || !trail.is_empty() || dots > 0 {
                self.draw_adjunct(point, lead, core, trail, dots);
                return;
            }
        }
        self.primitives.push(Primitive::Text {
            x: o.cx - o.rw,
            y: o.cy + o.rh,
            text: text.to_string(),
            size: point.font_size,
            bold: point.bold,
            color: point.color.clone(),
        });
    }

    /// Signs become stroked glyphs and dots filled circles, each taking one
    /// character cell of the adjunct's box; the core is drawn as text.
    fn draw_adjunct(
        &mut self,
        point: &ArrangedPoint,
        lead: &str,
        core: &str,
        trail: &str,
        dots: usize,
    ) {
        let o = point.oval;
        let core_chars = core.chars().count();
        let cells = lead.len() + core_chars + trail.len() + dots;
        let cell = 2.0 * o.rw / cells.max(1) as f32;
        let height = 2.0 * o.rh;
        let left = o.cx - o.rw;
        let centre = |k: usize| left + (k as f32 + 0.5) * cell;
        let arm = SIGN_ARM * cell.min(height);
        let stroke = SIGN_STROKE * point.font_size;

        let sign = |primitives: &mut Vec<Primitive>, k: usize, ch: char| {
            let x = centre(k);
            primitives.push(Primitive::stroke(x - arm, o.cy, x + arm, o.cy, &point.color, stroke));
            if ch == '+' {
                let bar = Primitive::stroke(x, o.cy - arm, x, o.cy + arm, &point.color, stroke);
                primitives.push(bar);
            }
        };

        for (k, ch) in lead.chars().enumerate() {
            sign(&mut self.primitives, k, ch);
        }
        if !core.is_empty() {
            self.primitives.push(Primitive::Text {
                x: left + lead.len() as f32 * cell,
                y: o.cy + o.rh,
                text: core.to_string(),
                size: point.font_size,
                bold: point.bold,
                color: point.color.clone(),
            });
        }
        let after_core = lead.len() + core_chars;
        for (j, ch) in trail.chars().enumerate() {
            sign(&mut self.primitives, after_core + j, ch);
        }
        let radius = DOT_RADIUS * cell.min(height);
        for j in 0..dots {
            let x = centre(after_core + trail.len() + j);
            self.primitives
                .push(Primitive::filled_dot(x, o.cy, radius, &point.color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::arrange;
    use crate::molecule::Bond;
    use crate::text_metrics::ApproxMetrics;

    fn drawn(mol: &Molecule) -> Drawing {
        let policy = RenderPolicy::default();
        let layout = arrange(mol, &policy, &ApproxMetrics);
        draw_molecule(&layout, mol, &policy)
    }

    #[test]
    fn adjunct_strings_split_into_runs() {
        assert_eq!(split_adjunct("+"), ("+", "", "", 0));
        assert_eq!(split_adjunct("2+"), ("", "2", "+", 0));
        assert_eq!(split_adjunct("-.."), ("-", "", "", 2));
        assert_eq!(split_adjunct("15"), ("", "15", "", 0));
    }

    #[test]
    fn everything_lands_inside_the_padded_drawing() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", -3.0, 2.0);
        let b = mol.add_atom("O", -1.5, 2.0);
        mol.add_bond(a, b, 2);
        let drawing = drawn(&mol);
        assert!(drawing.width > 30.0 && drawing.height > 4.0);
        for prim in &drawing.primitives {
            match prim {
                Primitive::Line { x1, y1, x2, y2, .. } => {
                    for v in [*x1, *x2] {
                        assert!(v >= 0.0 && v <= drawing.width);
                    }
                    for v in [*y1, *y2] {
                        assert!(v >= 0.0 && v <= drawing.height);
                    }
                }
                Primitive::Text { x, y, .. } => {
                    assert!(*x >= 0.0 && *x <= drawing.width);
                    assert!(*y >= 0.0 && *y <= drawing.height);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn wedge_is_one_filled_polygon() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        mol.add_bond_full(Bond::new(a, b, 1).with_kind(BondType::Inclined));
        let drawing = drawn(&mol);
        let paths: Vec<_> = drawing
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Path { points, closed, fill, .. } => Some((points, closed, fill)),
                _ => None,
            })
            .collect();
        assert_eq!(paths.len(), 1);
        let (points, closed, fill) = paths[0];
        assert_eq!(points.len(), 4);
        assert!(*closed && fill.is_some());
        // Wider at the far end.
        let narrow = (points[0].1 - points[3].1).abs();
        let wide = (points[1].1 - points[2].1).abs();
        assert!(wide > narrow);
    }

    #[test]
    fn wedge_clips_to_neighbouring_bonds() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", 2.25, 1.3);
        let d = mol.add_atom("C", 2.25, -1.3);
        mol.add_bond_full(Bond::new(a, b, 1).with_kind(BondType::Inclined));
        mol.add_bond(b, c, 1);
        mol.add_bond(b, d, 1);
        let policy = RenderPolicy::default();
        let layout = arrange(&mol, &policy, &ApproxMetrics);
        let wedge = layout.lines.iter().find(|l| l.kind == LineType::Inclined).unwrap();
        let painter = Painter {
            layout: &layout,
            mol: &mol,
            primitives: Vec::new(),
        };
        assert_eq!(painter.clip_neighbours(wedge).len(), 2);
        let polygon = painter.wedge_polygon(wedge, true);
        // Clipped corners reach past the far atom along the neighbour bonds.
        assert!(polygon[1].0 > wedge.line.x2);
        assert!(polygon[2].0 > wedge.line.x2);
    }

    #[test]
    fn hash_ticks_widen_toward_the_far_end() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", -0.75, 1.3);
        mol.add_bond_full(Bond::new(a, b, 1).with_kind(BondType::Declined));
        mol.add_bond(a, c, 1);
        let drawing = drawn(&mol);
        let ticks: Vec<f32> = drawing
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Line { x1, y1, x2, y2, .. } if (x1 - x2).abs() < 1e-3 => {
                    Some((y1 - y2).abs())
                }
                _ => None,
            })
            .collect();
        assert!(ticks.len() >= 4);
        assert!(ticks.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn dotted_bond_draws_dots_and_squiggle_a_path() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", 3.0, 0.5);
        mol.add_bond(a, b, 0);
        mol.add_bond_full(Bond::new(b, c, 1).with_kind(BondType::Unknown));
        let drawing = drawn(&mol);
        let dots = drawing
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Oval { .. }))
            .count();
        assert!(dots >= 2);
        let squiggle = drawing.primitives.iter().find_map(|p| match p {
            Primitive::Path { controls, .. } => Some(controls),
            _ => None,
        });
        let controls = squiggle.unwrap();
        assert!(controls.iter().any(|c| matches!(c, PathControl::Quadratic { .. })));
    }

    #[test]
    fn charge_is_drawn_as_strokes_not_text() {
        let mut mol = Molecule::new();
        let n = mol.add_atom("N", 0.0, 0.0);
        mol.set_atom_charge(n, 1);
        mol.set_atom_hydrogens(n, Some(0));
        let drawing = drawn(&mol);
        let texts: Vec<&str> = drawing
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["N"]);
        let strokes = drawing
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count();
        assert_eq!(strokes, 2);
    }

    #[test]
    fn multi_order_wedge_adds_parallel_lines() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        mol.add_bond_full(Bond::new(a, b, 3).with_kind(BondType::Inclined));
        let drawing = drawn(&mol);
        let lines = drawing
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count();
        assert_eq!(lines, 2);
    }
}
