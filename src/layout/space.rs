use serde::Serialize;

use crate::geom::{BBox, Point, polygons_overlap, rects_intersect};
use crate::molecule::{AtomIndex, BondIndex};

const PREFILTER_PAD: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum SpaceOwner {
    Atom(AtomIndex),
    Bond(BondIndex),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceEntry {
    pub owner: SpaceOwner,
    pub bbox: BBox,
    pub polygon: Vec<Point>,
}

/// Append-only list of occupied regions consulted by every placement.
#[derive(Debug, Clone, Default)]
pub struct SpaceIndex {
    entries: Vec<SpaceEntry>,
}

impl SpaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: SpaceOwner, polygon: Vec<Point>) -> usize {
        let bbox = BBox::from_points(&polygon);
        self.entries.push(SpaceEntry {
            owner,
            bbox,
            polygon,
        });
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[SpaceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn atom_entries(&self, atom: AtomIndex) -> impl Iterator<Item = &SpaceEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.owner == SpaceOwner::Atom(atom))
    }

    /// Number of entries the polygon crosses, contains or sits inside.
    /// With `short_circuit` the scan stops at the first hit.
    pub fn count_poly_violations(&self, polygon: &[Point], short_circuit: bool) -> usize {
        self.count_poly_violations_filtered(polygon, short_circuit, |_| false)
    }

    /// As [`count_poly_violations`](Self::count_poly_violations), ignoring
    /// entries for which `skip` returns true.
    pub fn count_poly_violations_filtered(
        &self,
        polygon: &[Point],
        short_circuit: bool,
        skip: impl Fn(&SpaceEntry) -> bool,
    ) -> usize {
        if polygon.is_empty() {
            return 0;
        }
        let bbox = BBox::from_points(polygon).inflate(PREFILTER_PAD);
        let mut hits = 0;
        for entry in &self.entries {
            if !rects_intersect(&bbox, &entry.bbox) || skip(entry) {
                continue;
            }
            if polygons_overlap(polygon, &entry.polygon) {
                hits += 1;
                if short_circuit {
                    break;
                }
            }
        }
        hits
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        for entry in &mut self.entries {
            entry.bbox.x += dx;
            entry.bbox.y += dy;
            for point in &mut entry.polygon {
                point.0 += dx;
                point.1 += dy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::rect_polygon;

    fn index() -> SpaceIndex {
        let mut space = SpaceIndex::new();
        space.push(SpaceOwner::Atom(AtomIndex::new(1)), rect_polygon(0.0, 0.0, 10.0, 10.0));
        space.push(SpaceOwner::Atom(AtomIndex::new(2)), rect_polygon(5.0, 5.0, 10.0, 10.0));
        space.push(SpaceOwner::Bond(BondIndex::new(1)), rect_polygon(40.0, 0.0, 2.0, 2.0));
        space
    }

    #[test]
    fn counts_every_overlap() {
        let space = index();
        let probe = rect_polygon(6.0, 6.0, 1.0, 1.0);
        assert_eq!(space.count_poly_violations(&probe, false), 2);
        assert_eq!(space.count_poly_violations(&probe, true), 1);
    }

    #[test]
    fn clear_region_has_no_violations() {
        let space = index();
        let probe = rect_polygon(20.0, 20.0, 3.0, 3.0);
        assert_eq!(space.count_poly_violations(&probe, false), 0);
    }

    #[test]
    fn touching_counts_as_violation() {
        let space = index();
        let probe = rect_polygon(42.0, 0.0, 1.0, 1.0);
        assert_eq!(space.count_poly_violations(&probe, false), 1);
    }

    #[test]
    fn filter_skips_entries() {
        let space = index();
        let probe = rect_polygon(6.0, 6.0, 1.0, 1.0);
        let hits = space.count_poly_violations_filtered(&probe, false, |entry| {
            entry.owner == SpaceOwner::Atom(AtomIndex::new(1))
        });
        assert_eq!(hits, 1);
        assert_eq!(space.atom_entries(AtomIndex::new(2)).count(), 1);
    }

    #[test]
    fn offset_moves_boxes_and_polygons() {
        let mut space = index();
        space.offset(1.0, 2.0);
        let entry = &space.entries()[0];
        assert_eq!(entry.bbox.x, 1.0);
        assert_eq!(entry.polygon[0], (1.0, 2.0));
    }
}
