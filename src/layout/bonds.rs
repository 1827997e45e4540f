// Bond line placement. Lines are clipped against the labels at either end,
// kept above a minimum visible length, and double bonds are deferred so
// ring-interior lines are decided before chain double bonds pick a side.

use std::f32::consts::PI;

use super::{ArrangedLine, Arranger, LineType, SpaceOwner};
use crate::geom::{Line, Point, line_polygon, norm, point_in_polygon, segment_param};
use crate::molecule::{AtomIndex, BondIndex, BondType};

const MIN_SINGLE_RATIO: f32 = 0.25;
const MIN_OTHER_RATIO: f32 = 0.5;
const RING_ORDER: [usize; 5] = [6, 5, 7, 4, 3];
/// Distance either side of a double bond probed on a priority tie, in
/// angstroms.
const DOUBLE_PROBE: f32 = 0.5;
/// Inset of a chain double bond's second line where it meets substituents:
/// `1 / tan(60deg)` bond separations.
const CHAIN_INSET_RATIO: f32 = 0.577_350_3;
const MAX_PARALLEL: u8 = 4;
const SIDE_EPS: f32 = 1e-4;

/// Keep `clipped` (which lies along `raw`) at least `min_len` long,
/// re-expanding symmetrically about its midpoint when it is shorter.
pub(super) fn ensure_min_length(raw: &Line, clipped: Line, min_len: f32) -> Line {
    let Some((dx, dy)) = raw.direction() else {
        return clipped;
    };
    let along = |p: Point| (p.0 - raw.x1) * dx + (p.1 - raw.y1) * dy;
    let t1 = along(clipped.start());
    let t2 = along(clipped.end());
    if t2 - t1 >= min_len {
        return clipped;
    }
    let mid = 0.5 * (t1 + t2);
    let half = 0.5 * min_len;
    Line::new(
        raw.x1 + dx * (mid - half),
        raw.y1 + dy * (mid - half),
        raw.x1 + dx * (mid + half),
        raw.y1 + dy * (mid + half),
    )
}

/// Trim `head` and `tail` off either end of a line; a line shorter than the
/// combined trim collapses to its midpoint.
pub(super) fn shrink_line(line: &Line, head: f32, tail: f32) -> Line {
    let Some((dx, dy)) = line.direction() else {
        return *line;
    };
    let len = line.length();
    if head + tail >= len {
        let (mx, my) = line.midpoint();
        return Line::new(mx, my, mx, my);
    }
    Line::new(
        line.x1 + dx * head,
        line.y1 + dy * head,
        line.x2 - dx * tail,
        line.y2 - dy * tail,
    )
}

fn perpendicular(line: &Line) -> Option<Point> {
    line.direction().map(|(dx, dy)| (-dy, dx))
}

impl Arranger<'_> {
    pub(super) fn create_bonds(&mut self) {
        let mut deferred = Vec::new();
        for bond in self.mol.bond_indices() {
            let b = self.mol.bond(bond);
            if b.order == 2 && matches!(b.kind, BondType::Normal | BondType::Unknown) {
                deferred.push(bond);
                continue;
            }
            self.create_bond_lines(bond);
        }
        self.place_ring_doubles(&mut deferred);
        for bond in deferred {
            self.place_chain_double(bond);
        }
    }

    fn bond_raw_line(&self, bond: BondIndex) -> (AtomIndex, AtomIndex, Line) {
        let b = self.mol.bond(bond);
        let line = Line::from_points(self.atom_xy(b.from), self.atom_xy(b.to));
        (b.from, b.to, line)
    }

    fn min_length(&self, bond: BondIndex) -> f32 {
        let b = self.mol.bond(bond);
        if b.order == 1 && b.kind == BondType::Normal {
            MIN_SINGLE_RATIO * self.scale
        } else {
            MIN_OTHER_RATIO * self.scale
        }
    }

    fn push_line(
        &mut self,
        bond: BondIndex,
        from: AtomIndex,
        to: AtomIndex,
        kind: LineType,
        line: Line,
        head: f32,
    ) {
        let polygon = line_polygon(&line, head.max(0.5 * self.line_size));
        self.space.push(SpaceOwner::Bond(bond), polygon);
        tracing::trace!(bond = %bond, ?kind, length = line.length(), "bond line");
        self.lines.push(ArrangedLine {
            bnum: bond,
            bfr: from,
            bto: to,
            kind,
            line,
            size: self.line_size,
            head,
            color: self.policy.foreground.clone(),
        });
    }

    /// Point where the segment `from -> toward` leaves the atom's label,
    /// pushed out by one stroke width.
    fn back_off(&self, atom: AtomIndex, from: Point, toward: Point) -> Point {
        let len = norm(toward.0 - from.0, toward.1 - from.1);
        if len <= 0.0 {
            return from;
        }
        let mut exit: Option<f32> = None;
        let mut swallowed = false;
        for entry in self.space.atom_entries(atom) {
            let poly = &entry.polygon;
            let n = poly.len();
            for i in 0..n {
                if let Some(t) = segment_param(from, toward, poly[i], poly[(i + 1) % n]) {
                    exit = Some(exit.map_or(t, |best| best.max(t)));
                }
            }
            swallowed |= point_in_polygon(toward, poly);
        }
        let t = match exit {
            Some(t) => (t + self.line_size / len).min(1.0),
            None if swallowed => 1.0,
            None => return from,
        };
        (from.0 + (toward.0 - from.0) * t, from.1 + (toward.1 - from.1) * t)
    }

    /// Clip both ends of `seg` against the labels of whichever endpoint atoms
    /// carry one.
    fn clip_to_labels(&self, from: AtomIndex, to: AtomIndex, seg: Line) -> Line {
        let mut start = seg.start();
        let mut end = seg.end();
        if self.has_label(from) {
            start = self.back_off(from, seg.start(), seg.end());
        }
        if self.has_label(to) {
            end = self.back_off(to, seg.end(), seg.start());
        }
        Line::from_points(start, end)
    }

    fn backed_line(&self, from: AtomIndex, to: AtomIndex, raw: Line, min_len: f32) -> Line {
        ensure_min_length(&raw, self.clip_to_labels(from, to, raw), min_len)
    }

    fn create_bond_lines(&mut self, bond: BondIndex) {
        let (from, to, raw) = self.bond_raw_line(bond);
        let Some((nx, ny)) = perpendicular(&raw) else {
            tracing::debug!(bond = %bond, "zero-length bond; skipping back-off");
            self.push_line(bond, from, to, LineType::Normal, raw, 0.0);
            return;
        };
        let (order, kind) = {
            let b = self.mol.bond(bond);
            (b.order, b.kind)
        };
        let min_len = self.min_length(bond);

        match (order, kind) {
            (0, _) => {
                let line_type = match kind {
                    BondType::Inclined | BondType::Declined => LineType::DotDir,
                    _ => LineType::Dotted,
                };
                let nudged = self.nudge_zero_order(from, to, raw);
                let line = self.backed_line(from, to, nudged, min_len);
                self.push_line(bond, from, to, line_type, line, 0.0);
            }
            (_, BondType::Inclined) => {
                let line_type = match order {
                    1 => LineType::Inclined,
                    2 => LineType::IncDouble,
                    3 => LineType::IncTriple,
                    _ => LineType::IncQuadruple,
                };
                let line = self.backed_line(from, to, raw, min_len);
                self.push_line(bond, from, to, line_type, line, self.head);
            }
            (_, BondType::Declined) => {
                let line = self.backed_line(from, to, raw, min_len);
                self.push_line(bond, from, to, LineType::Declined, line, self.head);
            }
            (1, BondType::Unknown) => {
                let line = self.backed_line(from, to, raw, min_len);
                self.push_line(bond, from, to, LineType::Unknown, line, self.head);
            }
            (1, _) => {
                let line = self.backed_line(from, to, raw, min_len);
                self.push_line(bond, from, to, LineType::Normal, line, 0.0);
            }
            _ => {
                let count = order.min(MAX_PARALLEL);
                let centre = 0.5 * f32::from(count - 1);
                for k in 0..count {
                    let off = (f32::from(k) - centre) * self.bond_sep;
                    let offset = raw.offset(nx * off, ny * off);
                    let line = self.backed_line(from, to, offset, min_len);
                    self.push_line(bond, from, to, LineType::Normal, line, 0.0);
                }
            }
        }
    }

    /// Shift a zero-order bond half a separation toward the less congested
    /// side, unless either end is terminal.
    fn nudge_zero_order(&self, from: AtomIndex, to: AtomIndex, raw: Line) -> Line {
        if self.mol.atom_adj_count(from) <= 1 || self.mol.atom_adj_count(to) <= 1 {
            return raw;
        }
        let Some((nx, ny)) = perpendicular(&raw) else {
            return raw;
        };
        let (mx, my) = raw.midpoint();
        let probe = DOUBLE_PROBE * self.scale;
        let plus = self.spatial_congestion(mx + nx * probe, my + ny * probe);
        let minus = self.spatial_congestion(mx - nx * probe, my - ny * probe);
        let shift = (if plus <= minus { 0.5 } else { -0.5 }) * self.bond_sep;
        raw.offset(nx * shift, ny * shift)
    }

    fn place_ring_doubles(&mut self, deferred: &mut Vec<BondIndex>) {
        let mol = self.mol;
        for size in RING_ORDER {
            if deferred.is_empty() {
                return;
            }
            let rings = mol.find_rings_of_size(size);
            let ring_bonds = |ring: &[AtomIndex]| -> Vec<BondIndex> {
                (0..ring.len())
                    .filter_map(|i| mol.find_bond(ring[i], ring[(i + 1) % ring.len()]))
                    .collect()
            };
            let mut ranked: Vec<(usize, &Vec<AtomIndex>)> = rings
                .iter()
                .map(|ring| {
                    let pending = ring_bonds(ring)
                        .iter()
                        .filter(|bond| deferred.contains(*bond))
                        .count();
                    (pending, ring)
                })
                .collect();
            ranked.sort_by(|a, b| b.0.cmp(&a.0));

            for (pending, ring) in ranked {
                if pending == 0 {
                    continue;
                }
                let centroid = self.ring_centroid(ring);
                for bond in ring_bonds(ring) {
                    if let Some(pos) = deferred.iter().position(|&d| d == bond) {
                        deferred.remove(pos);
                        self.place_ring_double(bond, centroid, size);
                    }
                }
            }
        }
    }

    fn ring_centroid(&self, ring: &[AtomIndex]) -> Point {
        let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), &atom| {
            let (x, y) = self.atom_xy(atom);
            (sx + x, sy + y)
        });
        let n = ring.len().max(1) as f32;
        (sx / n, sy / n)
    }

    /// Axis line plus an inner line offset toward the ring centre and
    /// shortened to meet the neighbouring ring edges.
    fn place_ring_double(&mut self, bond: BondIndex, centroid: Point, size: usize) {
        let (from, to, raw) = self.bond_raw_line(bond);
        let Some((mut nx, mut ny)) = perpendicular(&raw) else {
            tracing::debug!(bond = %bond, "zero-length ring double bond");
            self.push_line(bond, from, to, LineType::Normal, raw, 0.0);
            return;
        };
        let min_len = self.min_length(bond);
        let axis = self.backed_line(from, to, raw, min_len);
        self.push_line(bond, from, to, LineType::Normal, axis, 0.0);

        let (mx, my) = raw.midpoint();
        if (centroid.0 - mx) * nx + (centroid.1 - my) * ny < 0.0 {
            nx = -nx;
            ny = -ny;
        }
        let inner_raw = raw.offset(nx * self.bond_sep, ny * self.bond_sep);
        let interior = PI * (size as f32 - 2.0) / size as f32;
        let inset = self.bond_sep / (0.5 * interior).tan();
        let shrunk = shrink_line(&inner_raw, inset, inset);
        let inner = ensure_min_length(&inner_raw, self.clip_to_labels(from, to, shrunk), min_len);
        self.push_line(bond, from, to, LineType::Normal, inner, 0.0);
    }

    fn place_chain_double(&mut self, bond: BondIndex) {
        let (from, to, raw) = self.bond_raw_line(bond);
        let Some((nx, ny)) = perpendicular(&raw) else {
            tracing::debug!(bond = %bond, "zero-length double bond; skipping offset");
            self.push_line(bond, from, to, LineType::Normal, raw, 0.0);
            return;
        };
        let min_len = self.min_length(bond);

        let Some(sign) = self.double_bond_side(from, to, &raw) else {
            for off in [-0.5 * self.bond_sep, 0.5 * self.bond_sep] {
                let offset = raw.offset(nx * off, ny * off);
                let line = self.backed_line(from, to, offset, min_len);
                self.push_line(bond, from, to, LineType::Normal, line, 0.0);
            }
            return;
        };

        let axis = self.backed_line(from, to, raw, min_len);
        self.push_line(bond, from, to, LineType::Normal, axis, 0.0);

        let off = sign * self.bond_sep;
        let second_raw = raw.offset(nx * off, ny * off);
        let inset = |atom: AtomIndex| {
            if !self.has_label(atom) && self.mol.atom_adj_count(atom) > 1 {
                CHAIN_INSET_RATIO * self.bond_sep
            } else {
                0.0
            }
        };
        let shrunk = shrink_line(&second_raw, inset(from), inset(to));
        let second = ensure_min_length(&second_raw, self.clip_to_labels(from, to, shrunk), min_len);
        self.push_line(bond, from, to, LineType::Normal, second, 0.0);
    }

    /// Side for a chain double bond's second line: `Some(1.0)` along the
    /// left-hand normal of `raw`, `Some(-1.0)` opposite, `None` to straddle
    /// the axis symmetrically.
    fn double_bond_side(&self, from: AtomIndex, to: AtomIndex, raw: &Line) -> Option<f32> {
        let (dx, dy) = (raw.x2 - raw.x1, raw.y2 - raw.y1);
        let side = |atom: AtomIndex| -> i8 {
            let (px, py) = self.atom_xy(atom);
            let cross = dx * (py - raw.y1) - dy * (px - raw.x1);
            if cross > SIDE_EPS {
                1
            } else if cross < -SIDE_EPS {
                -1
            } else {
                0
            }
        };
        let substituents = |atom: AtomIndex, other: AtomIndex| -> Vec<AtomIndex> {
            self.mol
                .atom_adj_list(atom)
                .iter()
                .copied()
                .filter(|&n| n != other)
                .collect()
        };
        let subs_from = substituents(from, to);
        let subs_to = substituents(to, from);

        if subs_from.is_empty() || subs_to.is_empty() {
            let others = if subs_from.is_empty() { &subs_to } else { &subs_from };
            let positive = others.iter().any(|&n| side(n) > 0);
            let negative = others.iter().any(|&n| side(n) < 0);
            if positive == negative {
                return None;
            }
        }

        let (mut positive, mut negative) = (0.0f32, 0.0f32);
        for &sub in subs_from.iter().chain(subs_to.iter()) {
            let priority = if self.mol.atom_ring_block(sub) > 0 { 2.0 } else { 1.0 };
            match side(sub) {
                1 => positive += priority,
                -1 => negative += priority,
                _ => {}
            }
        }
        if positive < negative {
            return Some(1.0);
        }
        if negative < positive {
            return Some(-1.0);
        }

        let len = norm(dx, dy);
        let (nx, ny) = (-dy / len, dx / len);
        let (mx, my) = raw.midpoint();
        let probe = DOUBLE_PROBE * self.scale;
        let plus = self.spatial_congestion(mx + nx * probe, my + ny * probe);
        let minus = self.spatial_congestion(mx - nx * probe, my - ny * probe);
        Some(if plus <= minus { 1.0 } else { -1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::arrange;
    use crate::molecule::Molecule;
    use crate::text_metrics::ApproxMetrics;
    use crate::theme::RenderPolicy;

    fn benzene() -> Molecule {
        let mut mol = Molecule::new();
        let atoms: Vec<AtomIndex> = (0..6)
            .map(|i| {
                let theta = PI / 3.0 * i as f32;
                mol.add_atom("C", 1.4 * theta.cos(), 1.4 * theta.sin())
            })
            .collect();
        for i in 0..6 {
            let order = if i % 2 == 0 { 2 } else { 1 };
            mol.add_bond(atoms[i], atoms[(i + 1) % 6], order);
        }
        mol
    }

    #[test]
    fn min_length_reexpands_about_midpoint() {
        let raw = Line::new(0.0, 0.0, 10.0, 0.0);
        let clipped = Line::new(4.0, 0.0, 6.0, 0.0);
        let fixed = ensure_min_length(&raw, clipped, 5.0);
        assert!((fixed.length() - 5.0).abs() < 1e-4);
        assert!((fixed.midpoint().0 - 5.0).abs() < 1e-4);
        let long = Line::new(1.0, 0.0, 9.0, 0.0);
        assert_eq!(ensure_min_length(&raw, long, 5.0), long);
    }

    #[test]
    fn shrink_collapses_short_lines() {
        let line = Line::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(shrink_line(&line, 2.0, 3.0), Line::new(2.0, 0.0, 7.0, 0.0));
        assert_eq!(shrink_line(&line, 6.0, 6.0), Line::new(5.0, 0.0, 5.0, 0.0));
    }

    #[test]
    fn ring_double_bonds_sit_inside_the_ring() {
        let mol = benzene();
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        for (bond, b) in mol.bonds() {
            let lines: Vec<_> = layout.bond_lines(bond).collect();
            if b.order == 1 {
                assert_eq!(lines.len(), 1);
                continue;
            }
            assert_eq!(lines.len(), 2);
            // The centroid is the origin; the inner line is closer to it and shorter.
            let dist = |l: &Line| norm(l.midpoint().0, l.midpoint().1);
            assert!(dist(&lines[1].line) < dist(&lines[0].line));
            assert!(lines[1].line.length() < lines[0].line.length());
        }
    }

    #[test]
    fn labelled_ends_are_backed_off() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let o = mol.add_atom("O", 1.5, 0.0);
        let bond = mol.add_bond(c, o, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let line = layout.bond_lines(bond).next().unwrap().line;
        let label = layout.atom_point(o).oval;
        assert_eq!(line.x1, 0.0);
        assert!(line.x2 < label.cx - label.rw);
    }

    #[test]
    fn coincident_atoms_still_get_a_visible_bond() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("N", 0.0, 0.0);
        let b = mol.add_atom("O", 0.01, 0.0);
        let bond = mol.add_bond(a, b, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let line = layout.bond_lines(bond).next().unwrap().line;
        assert!(line.length() >= 0.25 * 20.0 - 1e-3);
    }

    #[test]
    fn terminal_double_bond_straddles_axis() {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom("C", 0.0, 0.0);
        let c2 = mol.add_atom("C", 1.5, 0.0);
        let o = mol.add_atom("O", 2.25, 1.3);
        let c3 = mol.add_atom("C", 2.25, -1.3);
        mol.add_bond(c1, c2, 1);
        let carbonyl = mol.add_bond(c2, o, 2);
        mol.add_bond(c2, c3, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let lines: Vec<_> = layout.bond_lines(carbonyl).collect();
        assert_eq!(lines.len(), 2);
        // Neither line lies on the axis between the atom centres.
        let (ax, ay) = (1.5 * 20.0, 0.0);
        let (bx, by) = (2.25 * 20.0, -1.3 * 20.0);
        for l in &lines {
            let (mx, my) = l.line.midpoint();
            let cross = (bx - ax) * (my - ay) - (by - ay) * (mx - ax);
            assert!(cross.abs() > 1.0);
        }
    }

    #[test]
    fn chain_double_goes_away_from_substituents() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let ra = mol.add_atom("C", -0.75, 1.3);
        let rb = mol.add_atom("C", 2.25, 1.3);
        let double = mol.add_bond(a, b, 2);
        mol.add_bond(a, ra, 1);
        mol.add_bond(b, rb, 1);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let lines: Vec<_> = layout.bond_lines(double).collect();
        assert_eq!(lines.len(), 2);
        // Substituents point up (negative device y); the second line goes down.
        assert!(lines[0].line.y1.abs() < 1e-4);
        assert!(lines[1].line.y1 > 0.0);
    }

    #[test]
    fn triple_bond_has_three_parallel_lines() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("N", 1.2, 0.0);
        let bond = mol.add_bond(a, b, 3);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let ys: Vec<f32> = layout.bond_lines(bond).map(|l| l.line.y1).collect();
        assert_eq!(ys.len(), 3);
        assert!((ys[0] + 4.0).abs() < 1e-3 && ys[1].abs() < 1e-3 && (ys[2] - 4.0).abs() < 1e-3);
    }

    #[test]
    fn stereo_and_zero_order_line_types() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", 0.0, 1.5);
        let d = mol.add_atom("C", -1.5, 0.0);
        let wedge =
            mol.add_bond_full(crate::molecule::Bond::new(a, b, 1).with_kind(BondType::Inclined));
        let hash =
            mol.add_bond_full(crate::molecule::Bond::new(a, c, 1).with_kind(BondType::Declined));
        let dotted = mol.add_bond(a, d, 0);
        let layout = arrange(&mol, &RenderPolicy::default(), &ApproxMetrics);
        let kind = |bond| layout.bond_lines(bond).next().unwrap().kind;
        assert_eq!(kind(wedge), LineType::Inclined);
        assert_eq!(kind(hash), LineType::Declined);
        assert_eq!(kind(dotted), LineType::Dotted);
        assert!((layout.bond_lines(wedge).next().unwrap().head - 3.0).abs() < 1e-4);
    }
}
