// Layout engine: turns a molecule into positioned glyph boxes and bond
// segments in device coordinates. Placement happens in a fixed order so
// later items can see everything placed before them in the occupied-space
// index: labels, bonds, deferred double bonds, hydrogens, adjuncts, and
// finally crossing resolution.

mod adjuncts;
mod bonds;
mod crossing;
mod labels;
pub mod space;
pub(crate) mod types;

pub use space::{SpaceEntry, SpaceIndex, SpaceOwner};
pub use types::*;

use crate::geom::{Oval, Point, quick_hull, rect_polygon};
use crate::molecule::{AtomIndex, Molecule};
use crate::text_metrics::TextMeasure;
use crate::theme::RenderPolicy;

/// Subscript and superscript glyphs relative to the label font.
const SCRIPT_SCALE: f32 = 0.7;
/// Charge and isotope glyphs relative to the label font.
const ADJUNCT_SCALE: f32 = 0.6;
/// Head half-width of wedges and hashes, in bond separations.
const HEAD_SEP_RATIO: f32 = 0.75;
const CONGESTION_EPS: f32 = 0.001;

/// Lay out `mol` for display with `policy`, measuring text with `measure`.
pub fn arrange(mol: &Molecule, policy: &RenderPolicy, measure: &dyn TextMeasure) -> Arrangement {
    let mut arranger = Arranger::new(mol, policy, measure);
    arranger.create_labels();
    arranger.create_bonds();
    arranger.place_hydrogens();
    arranger.place_adjuncts();
    arranger.resolve_crossings();
    tracing::debug!(
        atoms = mol.atom_count(),
        bonds = mol.bond_count(),
        points = arranger.points.len(),
        lines = arranger.lines.len(),
        "arranged molecule"
    );
    Arrangement {
        points: arranger.points,
        lines: arranger.lines,
        space: arranger.space,
        scale: arranger.scale,
    }
}

/// Mutable state threaded through the placement passes.
struct Arranger<'a> {
    mol: &'a Molecule,
    policy: &'a RenderPolicy,
    measure: &'a dyn TextMeasure,
    scale: f32,
    line_size: f32,
    bond_sep: f32,
    font_size: f32,
    head: f32,
    points: Vec<ArrangedPoint>,
    lines: Vec<ArrangedLine>,
    space: SpaceIndex,
    /// Per atom slot: whether the atom carries a visible plain label.
    labelled: Vec<bool>,
}

impl<'a> Arranger<'a> {
    fn new(mol: &'a Molecule, policy: &'a RenderPolicy, measure: &'a dyn TextMeasure) -> Self {
        let scale = policy.point_scale;
        Self {
            mol,
            policy,
            measure,
            scale,
            line_size: policy.line_size * scale,
            bond_sep: policy.bond_sep * scale,
            font_size: policy.font_size * scale,
            head: HEAD_SEP_RATIO * policy.bond_sep * scale,
            points: Vec::with_capacity(mol.atom_count()),
            lines: Vec::with_capacity(mol.bond_count()),
            space: SpaceIndex::new(),
            labelled: vec![false; mol.atom_count()],
        }
    }

    fn atom_xy(&self, atom: AtomIndex) -> Point {
        let a = self.mol.atom(atom);
        (a.x * self.scale, -a.y * self.scale)
    }

    fn has_label(&self, atom: AtomIndex) -> bool {
        self.labelled[atom.get() - 1]
    }

    fn atom_color(&self, atom: AtomIndex) -> String {
        self.policy.atom_color(&self.mol.atom(atom).element).to_string()
    }

    /// Sum of inverse squared distances (in angstroms) from `(x, y)` to
    /// every placed point centre.
    fn spatial_congestion(&self, x: f32, y: f32) -> f32 {
        let inv = 1.0 / self.scale;
        self.points
            .iter()
            .map(|point| {
                let dx = (point.oval.cx - x) * inv;
                let dy = (point.oval.cy - y) * inv;
                1.0 / (dx * dx + dy * dy + CONGESTION_EPS)
            })
            .sum()
    }

    /// Bounding polygon for `text` drawn with its left edge at `x` and its
    /// baseline at `baseline`: the glyph outline hull when outlines are
    /// available, otherwise the cap-height box.
    fn text_polygon(&self, text: &str, font_size: f32, x: f32, baseline: f32) -> Vec<Point> {
        let mut outline: Vec<Point> = Vec::new();
        let mut cursor = x;
        for ch in text.chars() {
            let Some(glyph) = self.measure.glyph_outline(ch, font_size) else {
                outline.clear();
                break;
            };
            outline.extend(glyph.iter().map(|&(gx, gy)| (cursor + gx, baseline + gy)));
            let mut buf = [0u8; 4];
            cursor += self.measure.measure_text(ch.encode_utf8(&mut buf), font_size).width;
        }
        if outline.len() >= 3 {
            let hull = quick_hull(&outline);
            if hull.len() >= 3 {
                return hull;
            }
        }
        let metrics = self.measure.measure_text(text, font_size);
        rect_polygon(x, baseline - metrics.ascent, metrics.width, metrics.ascent)
    }

    /// Glyph box for `text` centred on `(cx, cy)`.
    fn centred_box(&self, text: &str, font_size: f32, cx: f32, cy: f32) -> (Oval, Vec<Point>) {
        let metrics = self.measure.measure_text(text, font_size);
        let oval = Oval::new(cx, cy, 0.5 * metrics.width, 0.5 * metrics.ascent);
        let polygon = self.text_polygon(text, font_size, cx - oval.rw, cy + oval.rh);
        (oval, polygon)
    }
}
