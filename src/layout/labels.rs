// Atom label placement. Plain element symbols are centred on the atom;
// abbreviation labels are split into `|`-separated blocks whose first
// chunk sits on the atom and whose remaining blocks run away from the
// bonded neighbours.

use super::{ArrangedPoint, Arranger, SCRIPT_SCALE, SpaceOwner};
use crate::geom::{Oval, angle_diff};
use crate::molecule::AtomIndex;

const WEIRD_LINEAR_RAD: f32 = 175.0 * std::f32::consts::PI / 180.0;
const SUB_DROP: f32 = 0.3;
const SUPER_RISE: f32 = 0.55;
const SIDE_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Script {
    Normal,
    Sub,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LabelSegment {
    pub text: String,
    pub script: Script,
}

/// Split an abbreviation label into blocks of segments. `|` separates
/// blocks, `{..}` is a subscript run and `{^..}` a superscript run.
pub(super) fn parse_label_blocks(label: &str) -> Vec<Vec<LabelSegment>> {
    let mut blocks = Vec::new();
    for raw in label.split('|') {
        let mut segments = Vec::new();
        let mut normal = String::new();
        let mut chars = raw.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '{' {
                normal.push(ch);
                continue;
            }
            if !normal.is_empty() {
                segments.push(LabelSegment {
                    text: std::mem::take(&mut normal),
                    script: Script::Normal,
                });
            }
            let script = if chars.peek() == Some(&'^') {
                chars.next();
                Script::Super
            } else {
                Script::Sub
            };
            let text: String = chars.by_ref().take_while(|&c| c != '}').collect();
            if !text.is_empty() {
                segments.push(LabelSegment { text, script });
            }
        }
        if !normal.is_empty() {
            segments.push(LabelSegment {
                text: normal,
                script: Script::Normal,
            });
        }
        if !segments.is_empty() {
            blocks.push(segments);
        }
    }
    blocks
}

fn is_abbreviation(label: &str) -> bool {
    label.contains('|') || label.contains('{')
}

impl Arranger<'_> {
    /// Whether the atom needs a visible label rather than a bare vertex.
    pub(super) fn atom_explicit(&self, atom: AtomIndex) -> bool {
        let a = self.mol.atom(atom);
        if a.element != "C" || a.charge != 0 || a.unpaired != 0 || a.isotope != 0 {
            return true;
        }
        if self.mol.atom_adj_count(atom) == 0 {
            return true;
        }
        if let Some(explicit) = a.hydrogens
            && explicit != self.mol.implicit_hydrogens(atom)
        {
            return true;
        }
        self.is_weird_linear(atom)
    }

    /// Two neighbours lying almost straight through the atom; an unlabelled
    /// vertex there would be invisible.
    pub(super) fn is_weird_linear(&self, atom: AtomIndex) -> bool {
        let adj = self.mol.atom_adj_list(atom);
        if adj.len() != 2 {
            return false;
        }
        let centre = self.mol.atom(atom);
        let theta = |other: AtomIndex| {
            let o = self.mol.atom(other);
            (o.y - centre.y).atan2(o.x - centre.x)
        };
        angle_diff(theta(adj[0]), theta(adj[1])).abs() > WEIRD_LINEAR_RAD
    }

    pub(super) fn create_labels(&mut self) {
        let mut abbreviations = Vec::new();
        for atom in self.mol.atom_indices() {
            let (cx, cy) = self.atom_xy(atom);
            let color = self.atom_color(atom);
            let bold = self.mol.atom(atom).map_num > 0;
            if !self.atom_explicit(atom) {
                self.points.push(ArrangedPoint {
                    anum: Some(atom),
                    text: None,
                    font_size: self.font_size,
                    bold,
                    color,
                    oval: Oval::new(cx, cy, 0.0, 0.0),
                });
                continue;
            }
            self.labelled[atom.get() - 1] = true;

            let element = self.mol.atom(atom).element.clone();
            let (text, font_size) = if is_abbreviation(&element) {
                let blocks = parse_label_blocks(&element);
                let Some(first) = blocks.first().and_then(|block| block.first()).cloned() else {
                    tracing::debug!(atom = %atom, "empty abbreviation label");
                    self.points.push(ArrangedPoint {
                        anum: Some(atom),
                        text: None,
                        font_size: self.font_size,
                        bold,
                        color,
                        oval: Oval::new(cx, cy, 0.0, 0.0),
                    });
                    continue;
                };
                abbreviations.push((atom, blocks));
                (first.text.clone(), self.segment_font(first.script))
            } else {
                (element, self.font_size)
            };

            let (oval, polygon) = self.centred_box(&text, font_size, cx, cy);
            self.points.push(ArrangedPoint {
                anum: Some(atom),
                text: Some(text),
                font_size,
                bold,
                color,
                oval,
            });
            self.space.push(SpaceOwner::Atom(atom), polygon);
        }

        for (atom, blocks) in abbreviations {
            self.place_label_tail(atom, &blocks);
        }
    }

    fn segment_font(&self, script: Script) -> f32 {
        match script {
            Script::Normal => self.font_size,
            Script::Sub | Script::Super => SCRIPT_SCALE * self.font_size,
        }
    }

    fn segment_width(&self, segment: &LabelSegment) -> f32 {
        self.measure
            .measure_text(&segment.text, self.segment_font(segment.script))
            .width
    }

    /// True when the label should run left-to-right: the right side has
    /// fewer neighbours, or on a tie is less congested.
    fn label_runs_right(&self, atom: AtomIndex) -> bool {
        let (cx, cy) = self.atom_xy(atom);
        let (mut left, mut right) = (0usize, 0usize);
        for &other in self.mol.atom_adj_list(atom) {
            let (nx, _) = self.atom_xy(other);
            if nx < cx - SIDE_EPS {
                left += 1;
            } else if nx > cx + SIDE_EPS {
                right += 1;
            }
        }
        if left != right {
            return right < left;
        }
        let toward_right = self.spatial_congestion(cx + self.scale, cy);
        let toward_left = self.spatial_congestion(cx - self.scale, cy);
        toward_right <= toward_left
    }

    /// Lay out everything after the primary chunk. Left-to-right labels
    /// continue from the primary's right edge; right-to-left labels stack
    /// each chunk, the first block's scripts included, leftward from its
    /// left edge so nothing extends toward the bonds.
    fn place_label_tail(&mut self, atom: AtomIndex, blocks: &[Vec<LabelSegment>]) {
        let reference = self.points[atom.get() - 1].oval;
        let baseline = reference.cy + reference.rh;
        let ascent = 2.0 * reference.rh;
        let trailing = blocks[0][1..].iter();
        let rest = blocks[1..].iter().flatten();

        if self.label_runs_right(atom) {
            let mut cursor = reference.cx + reference.rw;
            for segment in trailing.chain(rest) {
                cursor += self.push_segment(atom, segment, cursor, baseline, ascent);
            }
        } else {
            let mut left = reference.cx - reference.rw;
            for segment in trailing {
                left -= self.segment_width(segment);
                self.push_segment(atom, segment, left, baseline, ascent);
            }
            for block in &blocks[1..] {
                let width: f32 = block.iter().map(|s| self.segment_width(s)).sum();
                left -= width;
                let mut x = left;
                for segment in block {
                    x += self.push_segment(atom, segment, x, baseline, ascent);
                }
            }
        }
    }

    /// Place one label chunk with its left edge at `x`; returns its advance.
    fn push_segment(
        &mut self,
        atom: AtomIndex,
        segment: &LabelSegment,
        x: f32,
        baseline: f32,
        ref_ascent: f32,
    ) -> f32 {
        let font_size = self.segment_font(segment.script);
        let metrics = self.measure.measure_text(&segment.text, font_size);
        let base = match segment.script {
            Script::Normal => baseline,
            Script::Sub => baseline + SUB_DROP * ref_ascent,
            Script::Super => baseline - SUPER_RISE * ref_ascent,
        };
        let oval = Oval::new(
            x + 0.5 * metrics.width,
            base - 0.5 * metrics.ascent,
            0.5 * metrics.width,
            0.5 * metrics.ascent,
        );
        let polygon = self.text_polygon(&segment.text, font_size, x, base);
        let reference = &self.points[atom.get() - 1];
        let (bold, color) = (reference.bold, reference.color.clone());
        self.points.push(ArrangedPoint {
            anum: None,
            text: Some(segment.text.clone()),
            font_size,
            bold,
            color,
            oval,
        });
        self.space.push(SpaceOwner::Atom(atom), polygon);
        metrics.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::Molecule;
    use crate::text_metrics::ApproxMetrics;
    use crate::theme::RenderPolicy;

    fn seg(text: &str, script: Script) -> LabelSegment {
        LabelSegment {
            text: text.to_string(),
            script,
        }
    }

    #[test]
    fn parses_blocks_and_scripts() {
        let blocks = parse_label_blocks("CO{2}|Me");
        assert_eq!(
            blocks,
            vec![
                vec![seg("CO", Script::Normal), seg("2", Script::Sub)],
                vec![seg("Me", Script::Normal)],
            ]
        );
        let charged = parse_label_blocks("N{^+}");
        assert_eq!(charged, vec![vec![seg("N", Script::Normal), seg("+", Script::Super)]]);
        assert!(parse_label_blocks("|").is_empty());
    }

    #[test]
    fn explicit_label_rules() {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom("C", 0.0, 0.0);
        let c2 = mol.add_atom("C", 1.5, 0.0);
        let o = mol.add_atom("O", 3.0, 0.0);
        let lone = mol.add_atom("C", 10.0, 10.0);
        mol.add_bond(c1, c2, 1);
        mol.add_bond(c2, o, 1);
        let policy = RenderPolicy::default();
        let arranger = Arranger::new(&mol, &policy, &ApproxMetrics);
        assert!(!arranger.atom_explicit(c1));
        assert!(arranger.atom_explicit(o));
        assert!(arranger.atom_explicit(lone));
        // c2 sits on a straight line between c1 and o.
        assert!(arranger.is_weird_linear(c2));
    }

    #[test]
    fn charge_isotope_and_hydrogen_override_force_labels() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        let c = mol.add_atom("C", 2.25, 1.3);
        mol.add_bond(a, b, 1);
        mol.add_bond(b, c, 1);
        mol.set_atom_isotope(a, 13);
        mol.set_atom_hydrogens(c, Some(1));
        let policy = RenderPolicy::default();
        let arranger = Arranger::new(&mol, &policy, &ApproxMetrics);
        assert!(arranger.atom_explicit(a));
        assert!(!arranger.atom_explicit(b));
        assert!(arranger.atom_explicit(c));
    }

    #[test]
    fn abbreviation_runs_away_from_neighbour() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let r = mol.add_atom("O|Me", -1.5, 0.0);
        mol.add_bond(c, r, 1);
        let policy = RenderPolicy::default();
        let layout = super::super::arrange(&mol, &policy, &ApproxMetrics);
        let reference = layout.atom_point(r);
        assert_eq!(reference.text.as_deref(), Some("O"));
        let tail = layout
            .points
            .iter()
            .find(|p| p.text.as_deref() == Some("Me"))
            .unwrap();
        assert!(tail.anum.is_none());
        // The neighbour is to the right, so the tail goes left.
        assert!(tail.oval.cx < reference.oval.cx);
    }

    #[test]
    fn abbreviation_tail_goes_right_when_neighbour_is_left() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let r = mol.add_atom("CO{2}|Me", 1.5, 0.0);
        mol.add_bond(c, r, 1);
        let policy = RenderPolicy::default();
        let layout = super::super::arrange(&mol, &policy, &ApproxMetrics);
        let reference = layout.atom_point(r).oval;
        let sub = layout.points.iter().find(|p| p.text.as_deref() == Some("2")).unwrap();
        let me = layout.points.iter().find(|p| p.text.as_deref() == Some("Me")).unwrap();
        assert!(sub.oval.cx > reference.cx);
        assert!(sub.oval.cy > reference.cy);
        assert!(me.oval.cx > sub.oval.cx);
        assert_eq!(layout.space.atom_entries(r).count(), 3);
    }

    #[test]
    fn right_to_left_scripts_stay_off_the_bond_side() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let r = mol.add_atom("CO{2}|Me", -1.5, 0.0);
        let bond = mol.add_bond(c, r, 1);
        let policy = RenderPolicy::default();
        let layout = super::super::arrange(&mol, &policy, &ApproxMetrics);
        let reference = layout.atom_point(r).oval;
        let sub = layout.points.iter().find(|p| p.text.as_deref() == Some("2")).unwrap();
        let me = layout.points.iter().find(|p| p.text.as_deref() == Some("Me")).unwrap();
        assert!(sub.oval.cx < reference.cx);
        assert!(sub.oval.cy > reference.cy);
        assert!(me.oval.cx < sub.oval.cx);

        let line = layout.bond_lines(bond).next().unwrap().line;
        let bond_left = line.x1.min(line.x2);
        for point in layout.points.iter().filter(|p| p.text.is_some()) {
            assert!(
                point.oval.cx + point.oval.rw <= bond_left + 1e-3,
                "{:?} reaches the bond",
                point.text
            );
        }
    }
}
