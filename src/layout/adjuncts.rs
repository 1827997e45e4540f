// Hydrogen suffixes and small annotations (charge, isotope) hung off atom
// labels. Each is placed at the first candidate that collides with nothing
// already in the occupied-space index, or else at the least bad one.

use std::f32::consts::PI;

use super::{ADJUNCT_SCALE, ArrangedPoint, Arranger, SCRIPT_SCALE, SpaceOwner};
use crate::geom::{Oval, Point, quick_hull};
use crate::molecule::AtomIndex;
use crate::text_metrics::TextMetrics;

const GAP_RATIO: f32 = 0.05;
const COUNT_DROP: f32 = 0.3;
const H_SEARCH_RINGS: usize = 6;
const H_SEARCH_ANGLES: usize = 24;
const ADJUNCT_EXTENSIONS: usize = 8;
const ADJUNCT_EXTENSION_STEP: f32 = 0.1;
const ANGLE_STEP: f32 = 15.0 * PI / 180.0;
const MAX_TOLERANCE_STEPS: usize = 12;
const CHARGE_ANGLE: f32 = 45.0 * PI / 180.0;
const ISOTOPE_ANGLE: f32 = 135.0 * PI / 180.0;
const VIOLATION_WEIGHT: f32 = 10.0;

/// Charge as `+`, `-`, `2+`, `3-` and so on, then one `.` per unpaired
/// electron.
pub(crate) fn charge_text(charge: i32, unpaired: u8) -> String {
    let mut text = match charge {
        0 => String::new(),
        1 => "+".to_string(),
        -1 => "-".to_string(),
        c if c > 0 => format!("{c}+"),
        c => format!("{}-", -c),
    };
    text.extend(std::iter::repeat_n('.', usize::from(unpaired)));
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    East,
    West,
    North,
    South,
}

/// Distance along unit direction `(ux, uy)` at which a box with half
/// extents `(ex, ey)` relative to the origin box stops overlapping it.
fn clearance(ux: f32, uy: f32, ex: f32, ey: f32) -> f32 {
    let along_x = if ux.abs() > 1e-6 { ex / ux.abs() } else { f32::INFINITY };
    let along_y = if uy.abs() > 1e-6 { ey / uy.abs() } else { f32::INFINITY };
    along_x.min(along_y)
}

struct HydrogenShape {
    points: Vec<ArrangedPoint>,
    polygon: Vec<Point>,
}

impl Arranger<'_> {
    pub(super) fn place_hydrogens(&mut self) {
        for atom in self.mol.atom_indices() {
            if !self.has_label(atom) {
                continue;
            }
            let count = self.mol.atom_hydrogens(atom);
            if count > 0 {
                self.place_hydrogen_block(atom, count);
            }
        }
    }

    fn blocked_sides(&self, atom: AtomIndex) -> Vec<Side> {
        let (cx, cy) = self.atom_xy(atom);
        self.mol
            .atom_adj_list(atom)
            .iter()
            .map(|&other| {
                let (nx, ny) = self.atom_xy(other);
                let (vx, vy) = (nx - cx, ny - cy);
                if vx.abs() >= vy.abs() {
                    if vx > 0.0 { Side::East } else { Side::West }
                } else if vy < 0.0 {
                    Side::North
                } else {
                    Side::South
                }
            })
            .collect()
    }

    /// Glyph boxes for `H` with an optional subscript count, the `H` having
    /// its left edge at `x` and baseline at `baseline`.
    fn hydrogen_shape(
        &self,
        reference: &ArrangedPoint,
        x: f32,
        baseline: f32,
        h: TextMetrics,
        count: Option<&(String, TextMetrics)>,
    ) -> HydrogenShape {
        let font_size = reference.font_size;
        let mut polygon = self.text_polygon("H", font_size, x, baseline);
        let mut points = vec![ArrangedPoint {
            anum: None,
            text: Some("H".to_string()),
            font_size,
            bold: reference.bold,
            color: reference.color.clone(),
            oval: Oval::new(
                x + 0.5 * h.width,
                baseline - 0.5 * h.ascent,
                0.5 * h.width,
                0.5 * h.ascent,
            ),
        }];
        if let Some((text, metrics)) = count {
            let cx = x + h.width;
            let cbase = baseline + COUNT_DROP * h.ascent;
            let sub_size = SCRIPT_SCALE * font_size;
            polygon.extend(self.text_polygon(text, sub_size, cx, cbase));
            points.push(ArrangedPoint {
                anum: None,
                text: Some(text.clone()),
                font_size: sub_size,
                bold: reference.bold,
                color: reference.color.clone(),
                oval: Oval::new(
                    cx + 0.5 * metrics.width,
                    cbase - 0.5 * metrics.ascent,
                    0.5 * metrics.width,
                    0.5 * metrics.ascent,
                ),
            });
            polygon = quick_hull(&polygon);
        }
        HydrogenShape { points, polygon }
    }

    fn commit_shape(&mut self, atom: AtomIndex, shape: HydrogenShape) {
        self.points.extend(shape.points);
        self.space.push(SpaceOwner::Atom(atom), shape.polygon);
    }

    fn place_hydrogen_block(&mut self, atom: AtomIndex, count: u8) {
        let reference = self.points[atom.get() - 1].clone();
        let font_size = reference.font_size;
        let h = self.measure.measure_text("H", font_size);
        let count = (count > 1).then(|| {
            let text = count.to_string();
            let metrics = self.measure.measure_text(&text, SCRIPT_SCALE * font_size);
            (text, metrics)
        });
        let block_width = h.width + count.as_ref().map_or(0.0, |(_, m)| m.width);
        let gap = GAP_RATIO * font_size;
        let o = reference.oval;
        let baseline = o.cy + o.rh;

        let blocked = self.blocked_sides(atom);
        for side in [Side::East, Side::West, Side::North, Side::South] {
            if blocked.contains(&side) {
                continue;
            }
            let (x, base) = match side {
                Side::East => (o.cx + o.rw + gap, baseline),
                Side::West => (o.cx - o.rw - gap - block_width, baseline),
                Side::North => (o.cx - 0.5 * h.width, o.cy - o.rh - gap),
                Side::South => (o.cx - 0.5 * h.width, o.cy + o.rh + gap + h.ascent),
            };
            let shape = self.hydrogen_shape(&reference, x, base, h, count.as_ref());
            if self.space.count_poly_violations(&shape.polygon, true) == 0 {
                self.commit_shape(atom, shape);
                return;
            }
        }

        tracing::debug!(atom = %atom, "no free side for hydrogens; searching");
        let r0 = (o.rw + 0.5 * block_width).hypot(o.rh + 0.5 * h.ascent) + gap;
        let mut best: Option<(f32, HydrogenShape)> = None;
        for ring in 0..H_SEARCH_RINGS {
            let radius = r0 + ring as f32 * 0.25 * font_size;
            for k in 0..H_SEARCH_ANGLES {
                let theta = 2.0 * PI * k as f32 / H_SEARCH_ANGLES as f32;
                let (cx, cy) = (o.cx + radius * theta.cos(), o.cy + radius * theta.sin());
                let shape = self.hydrogen_shape(
                    &reference,
                    cx - 0.5 * block_width,
                    cy + 0.5 * h.ascent,
                    h,
                    count.as_ref(),
                );
                let violations = self.space.count_poly_violations(&shape.polygon, false);
                let score = VIOLATION_WEIGHT * violations as f32
                    + self.spatial_congestion(cx, cy)
                    + 2.0 * radius / self.scale;
                if best.as_ref().is_none_or(|(s, _)| score < *s) {
                    best = Some((score, shape));
                }
            }
        }
        if let Some((_, shape)) = best {
            self.commit_shape(atom, shape);
        }
    }

    pub(super) fn place_adjuncts(&mut self) {
        for atom in self.mol.atom_indices() {
            if !self.has_label(atom) {
                continue;
            }
            let (isotope, charge, unpaired) = {
                let a = self.mol.atom(atom);
                (a.isotope, a.charge, a.unpaired)
            };
            if isotope != 0 {
                self.place_adjunct(atom, isotope.to_string(), ISOTOPE_ANGLE);
            }
            if charge != 0 || unpaired != 0 {
                self.place_adjunct(atom, charge_text(charge, unpaired), CHARGE_ANGLE);
            }
        }
    }

    /// Place `text` around the atom label, sweeping outward from the
    /// preferred angle (measured counter-clockwise from east) in 15 degree
    /// steps, then stepping the radius out.
    fn place_adjunct(&mut self, atom: AtomIndex, text: String, preferred: f32) {
        let reference = self.points[atom.get() - 1].clone();
        let o = reference.oval;
        let font_size = ADJUNCT_SCALE * reference.font_size;
        let metrics = self.measure.measure_text(&text, font_size);
        let (hw, hh) = (0.5 * metrics.width, 0.5 * metrics.ascent);
        let gap = GAP_RATIO * reference.font_size;

        let mut best: Option<(f32, Point)> = None;
        let mut chosen: Option<Point> = None;
        'search: for step in 0..ADJUNCT_EXTENSIONS {
            let extra = step as f32 * ADJUNCT_EXTENSION_STEP * self.scale;
            for tolerance in 0..=MAX_TOLERANCE_STEPS {
                for sign in [1.0f32, -1.0] {
                    if tolerance == 0 && sign < 0.0 {
                        continue;
                    }
                    let deviation = sign * tolerance as f32 * ANGLE_STEP;
                    let theta = preferred + deviation;
                    let (ux, uy) = (theta.cos(), -theta.sin());
                    let radius = clearance(ux, uy, o.rw + hw + gap, o.rh + hh + gap) + extra;
                    let centre = (o.cx + ux * radius, o.cy + uy * radius);
                    let polygon = self.text_polygon(&text, font_size, centre.0 - hw, centre.1 + hh);
                    if self.space.count_poly_violations(&polygon, true) == 0 {
                        chosen = Some(centre);
                        break 'search;
                    }
                    let violations = self.space.count_poly_violations(&polygon, false);
                    let score = VIOLATION_WEIGHT * violations as f32
                        + deviation.abs()
                        + VIOLATION_WEIGHT * extra / self.scale;
                    if best.is_none_or(|(s, _)| score < s) {
                        best = Some((score, centre));
                    }
                }
            }
        }
        let centre = match (chosen, best) {
            (Some(centre), _) => centre,
            (None, Some((_, centre))) => {
                tracing::debug!(atom = %atom, text = %text, "adjunct placed with overlap");
                centre
            }
            (None, None) => return,
        };

        let polygon = self.text_polygon(&text, font_size, centre.0 - hw, centre.1 + hh);
        self.space.push(SpaceOwner::Atom(atom), polygon);
        self.points.push(ArrangedPoint {
            anum: None,
            text: Some(text),
            font_size,
            bold: false,
            color: reference.color,
            oval: Oval::new(centre.0, centre.1, hw, hh),
        });
    }
}
