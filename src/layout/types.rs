use serde::Serialize;

use crate::geom::{BBox, Line, Oval};
use crate::molecule::{AtomIndex, BondIndex};

use super::space::SpaceIndex;

/// How an arranged bond segment is to be expanded into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineType {
    Normal,
    Inclined,
    Declined,
    Unknown,
    Dotted,
    DotDir,
    IncDouble,
    IncTriple,
    IncQuadruple,
}

/// One glyph box: an atom label, a label chunk, or an adjunct such as a
/// hydrogen suffix or a charge. Adjuncts have no owning atom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrangedPoint {
    pub anum: Option<AtomIndex>,
    pub text: Option<String>,
    pub font_size: f32,
    pub bold: bool,
    pub color: String,
    pub oval: Oval,
}

/// One rendered bond segment; a bond yields one to four of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrangedLine {
    pub bnum: BondIndex,
    pub bfr: AtomIndex,
    pub bto: AtomIndex,
    pub kind: LineType,
    pub line: Line,
    pub size: f32,
    /// Half-width at the wide end of wedges, hashes and squiggles.
    pub head: f32,
    pub color: String,
}

/// Everything the primitive emitter needs, in device coordinates.
#[derive(Debug, Clone)]
pub struct Arrangement {
    pub points: Vec<ArrangedPoint>,
    pub lines: Vec<ArrangedLine>,
    pub space: SpaceIndex,
    pub scale: f32,
}

impl Arrangement {
    /// The reference point for an atom; points are created in atom order.
    pub fn atom_point(&self, atom: AtomIndex) -> &ArrangedPoint {
        &self.points[atom.get() - 1]
    }

    pub fn bond_lines(&self, bond: BondIndex) -> impl Iterator<Item = &ArrangedLine> + '_ {
        self.lines.iter().filter(move |line| line.bnum == bond)
    }

    /// Extent of every label, line and atom centre.
    pub fn bounds(&self) -> Option<BBox> {
        let mut bounds: Option<BBox> = None;
        let mut grow = |next: BBox| {
            bounds = Some(match bounds {
                Some(current) => current.union(&next),
                None => next,
            });
        };
        for point in &self.points {
            if point.text.is_some() {
                grow(point.oval.bbox());
            } else {
                grow(BBox::new(point.oval.cx, point.oval.cy, 0.0, 0.0));
            }
        }
        for line in &self.lines {
            let pad = line.head.max(0.5 * line.size);
            grow(BBox::from_points(&[line.line.start(), line.line.end()]).inflate(pad));
        }
        bounds
    }

    pub fn offset_everything(&mut self, dx: f32, dy: f32) {
        for point in &mut self.points {
            point.oval.cx += dx;
            point.oval.cy += dy;
        }
        for line in &mut self.lines {
            line.line.translate(dx, dy);
        }
        self.space.offset(dx, dy);
    }
}
