// Crossing resolution: where a plain single bond passes over another bond
// that shares no atom with it, the later bond is broken around the
// crossing point so the earlier one reads as passing in front.

use super::{Arranger, ArrangedLine, LineType};
use crate::geom::{Line, do_line_segs_intersect, line_intersect};
use crate::molecule::BondType;

const MAX_PIECES: usize = 4;

/// Pieces of `line` left after cutting a gap of `half_gap` either side of
/// each crossing parameter (distance from the start). Pieces shorter than
/// `min_piece` are dropped.
fn split_line(line: &Line, crossings: &[f32], half_gap: f32, min_piece: f32) -> Vec<Line> {
    let Some((dx, dy)) = line.direction() else {
        return vec![*line];
    };
    let len = line.length();
    let mut cuts: Vec<f32> = crossings.to_vec();
    cuts.sort_by(f32::total_cmp);

    let mut pieces = Vec::new();
    let mut start = 0.0f32;
    for t in cuts {
        let end = t - half_gap;
        if end - start >= min_piece {
            pieces.push((start, end));
        }
        start = start.max(t + half_gap);
    }
    if len - start >= min_piece {
        pieces.push((start, len));
    }
    pieces
        .into_iter()
        .map(|(a, b)| {
            Line::new(
                line.x1 + dx * a,
                line.y1 + dy * a,
                line.x1 + dx * b,
                line.y1 + dy * b,
            )
        })
        .collect()
}

impl Arranger<'_> {
    fn splittable(&self, line: &ArrangedLine) -> bool {
        let bond = self.mol.bond(line.bnum);
        line.kind == LineType::Normal && bond.order == 1 && bond.kind == BondType::Normal
    }

    pub(super) fn resolve_crossings(&mut self) {
        let original = self.lines.clone();
        let mut resolved = Vec::with_capacity(original.len());
        for line in &original {
            if !self.splittable(line) {
                resolved.push(line.clone());
                continue;
            }
            let mut crossings = Vec::new();
            for other in &original {
                if other.bnum >= line.bnum
                    || other.bfr == line.bfr
                    || other.bfr == line.bto
                    || other.bto == line.bfr
                    || other.bto == line.bto
                {
                    continue;
                }
                let (a, b) = (line.line.start(), line.line.end());
                let (c, d) = (other.line.start(), other.line.end());
                if !do_line_segs_intersect(a, b, c, d) {
                    continue;
                }
                if let Some((px, py)) = line_intersect(a, b, c, d) {
                    crossings.push(crate::geom::norm(px - a.0, py - a.1));
                }
            }
            if crossings.is_empty() {
                resolved.push(line.clone());
                continue;
            }
            let pieces = split_line(&line.line, &crossings, self.bond_sep, self.line_size);
            if pieces.is_empty() || pieces.len() > MAX_PIECES {
                tracing::debug!(
                    bond = %line.bnum,
                    crossings = crossings.len(),
                    "crossing left unsplit"
                );
                resolved.push(line.clone());
                continue;
            }
            tracing::trace!(bond = %line.bnum, pieces = pieces.len(), "split crossing bond");
            resolved.extend(pieces.into_iter().map(|piece| ArrangedLine {
                line: piece,
                ..line.clone()
            }));
        }
        self.lines = resolved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::arrange;
    use crate::molecule::Molecule;
    use crate::text_metrics::ApproxMetrics;
    use crate::theme::RenderPolicy;

    #[test]
    fn split_leaves_a_gap_around_each_crossing() {
        let line = Line::new(0.0, 0.0, 20.0, 0.0);
        let pieces = split_line(&line, &[10.0], 2.0, 0.5);
        assert_eq!(pieces, vec![Line::new(0.0, 0.0, 8.0, 0.0), Line::new(12.0, 0.0, 20.0, 0.0)]);
        let near_end = split_line(&line, &[19.8], 2.0, 0.5);
        assert_eq!(near_end, vec![Line::new(0.0, 0.0, 17.8, 0.0)]);
    }

    #[test]
    fn later_bond_yields_at_a_crossing() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", -1.0, 0.0);
        let b = mol.add_atom("C", 1.0, 0.0);
        let c = mol.add_atom("C", 0.0, -1.0);
        let d = mol.add_atom("C", 0.0, 1.0);
        let first = mol.add_bond(a, b, 1);
        let second = mol.add_bond(c, d, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        assert_eq!(layout.bond_lines(first).count(), 1);
        let pieces: Vec<_> = layout.bond_lines(second).collect();
        assert_eq!(pieces.len(), 2);
        let gap = (pieces[1].line.y1 - pieces[0].line.y2).abs();
        assert!((gap - 2.0 * 4.0).abs() < 1e-3);
    }

    #[test]
    fn bonds_sharing_an_atom_are_not_split() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", 0.0, 1.5);
        mol.add_bond(a, b, 1);
        let second = mol.add_bond(a, c, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        assert_eq!(layout.bond_lines(second).count(), 1);
    }
}
