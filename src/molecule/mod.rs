//! Molecular graph: atoms and bonds with 2-D coordinates, plus lazily
//! derived adjacency, ring-block, component and ring-size information.

mod element;
mod graph;
mod hydrogen;
mod rings;
mod types;

pub use element::{ELEMENTS, atomic_number};
pub use types::{Atom, AtomIndex, Bond, BondIndex, BondType};

use graph::Adjacency;
use once_cell::sync::OnceCell;
use thiserror::Error;

/// Ring sizes that can be enumerated with [`Molecule::find_rings_of_size`].
pub const RING_SIZES: std::ops::RangeInclusive<usize> = 3..=7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoleculeError {
    #[error("atom index {index} out of range (molecule has {count} atoms)")]
    AtomOutOfRange { index: usize, count: usize },
    #[error("bond index {index} out of range (molecule has {count} bonds)")]
    BondOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    value: T,
}

#[derive(Debug, Clone, Default)]
struct DerivedCache {
    adjacency: OnceCell<Versioned<Adjacency>>,
    ring_blocks: OnceCell<Versioned<Vec<usize>>>,
    components: OnceCell<Versioned<Vec<usize>>>,
    rings: [OnceCell<Versioned<Vec<Vec<AtomIndex>>>>; 5],
}

/// Owns the atom and bond lists; insertion order is the canonical numbering.
///
/// Derived structures are computed on first access and tagged with the
/// structural version they were built against. Structural edits bump the
/// version and drop every cache; order/type edits drop only the ring memo.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    version: u64,
    cache: DerivedCache,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Structural version; bumped by every add/delete/re-link.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn atom(&self, idx: AtomIndex) -> &Atom {
        self.check_atom(idx);
        &self.atoms[idx.slot()]
    }

    pub fn bond(&self, idx: BondIndex) -> &Bond {
        self.check_bond(idx);
        &self.bonds[idx.slot()]
    }

    pub fn atoms(&self) -> impl Iterator<Item = (AtomIndex, &Atom)> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .map(|(slot, atom)| (AtomIndex::from_slot(slot), atom))
    }

    pub fn bonds(&self) -> impl Iterator<Item = (BondIndex, &Bond)> + '_ {
        self.bonds
            .iter()
            .enumerate()
            .map(|(slot, bond)| (BondIndex::from_slot(slot), bond))
    }

    pub fn atom_indices(&self) -> impl Iterator<Item = AtomIndex> + use<> {
        (0..self.atoms.len()).map(AtomIndex::from_slot)
    }

    pub fn bond_indices(&self) -> impl Iterator<Item = BondIndex> + use<> {
        (0..self.bonds.len()).map(BondIndex::from_slot)
    }

    // ---- structural mutation ----

    pub fn add_atom(&mut self, element: impl Into<String>, x: f32, y: f32) -> AtomIndex {
        self.add_atom_full(Atom::new(element, x, y))
    }

    pub fn add_atom_full(&mut self, atom: Atom) -> AtomIndex {
        self.atoms.push(atom);
        self.structure_changed();
        AtomIndex::from_slot(self.atoms.len() - 1)
    }

    pub fn add_bond(&mut self, from: AtomIndex, to: AtomIndex, order: u8) -> BondIndex {
        self.add_bond_full(Bond::new(from, to, order))
    }

    pub fn add_bond_full(&mut self, bond: Bond) -> BondIndex {
        self.check_atom(bond.from);
        self.check_atom(bond.to);
        assert_ne!(bond.from, bond.to, "bond endpoints must differ");
        self.bonds.push(bond);
        self.structure_changed();
        BondIndex::from_slot(self.bonds.len() - 1)
    }

    pub fn set_bond_from_to(&mut self, idx: BondIndex, from: AtomIndex, to: AtomIndex) {
        self.check_bond(idx);
        self.check_atom(from);
        self.check_atom(to);
        assert_ne!(from, to, "bond endpoints must differ");
        let bond = &mut self.bonds[idx.slot()];
        bond.from = from;
        bond.to = to;
        self.structure_changed();
    }

    pub fn delete_bond(&mut self, idx: BondIndex) -> Result<(), MoleculeError> {
        if idx.get() > self.bonds.len() {
            return Err(MoleculeError::BondOutOfRange {
                index: idx.get(),
                count: self.bonds.len(),
            });
        }
        self.bonds.remove(idx.slot());
        self.structure_changed();
        Ok(())
    }

    /// Removes the atom and every bond touching it. Bond endpoints above
    /// `idx` shift down by one.
    pub fn delete_atom_and_bonds(&mut self, idx: AtomIndex) -> Result<(), MoleculeError> {
        if idx.get() > self.atoms.len() {
            return Err(MoleculeError::AtomOutOfRange {
                index: idx.get(),
                count: self.atoms.len(),
            });
        }
        self.bonds.retain(|bond| !bond.touches(idx));
        for bond in &mut self.bonds {
            if bond.from > idx {
                bond.from = AtomIndex::new(bond.from.get() - 1);
            }
            if bond.to > idx {
                bond.to = AtomIndex::new(bond.to.get() - 1);
            }
        }
        self.atoms.remove(idx.slot());
        self.structure_changed();
        Ok(())
    }

    // ---- non-structural mutation ----

    pub fn set_atom_pos(&mut self, idx: AtomIndex, x: f32, y: f32) {
        let atom = self.atom_mut(idx);
        atom.x = x;
        atom.y = y;
    }

    pub fn set_atom_element(&mut self, idx: AtomIndex, element: impl Into<String>) {
        self.atom_mut(idx).element = element.into();
    }

    pub fn set_atom_charge(&mut self, idx: AtomIndex, charge: i32) {
        self.atom_mut(idx).charge = charge;
    }

    pub fn set_atom_unpaired(&mut self, idx: AtomIndex, unpaired: u8) {
        self.atom_mut(idx).unpaired = unpaired;
    }

    pub fn set_atom_isotope(&mut self, idx: AtomIndex, isotope: u16) {
        self.atom_mut(idx).isotope = isotope;
    }

    pub fn set_atom_hydrogens(&mut self, idx: AtomIndex, hydrogens: Option<u8>) {
        self.atom_mut(idx).hydrogens = hydrogens;
    }

    pub fn set_atom_map_num(&mut self, idx: AtomIndex, map_num: u32) {
        self.atom_mut(idx).map_num = map_num;
    }

    pub fn atom_extra_mut(&mut self, idx: AtomIndex) -> &mut Vec<String> {
        &mut self.atom_mut(idx).extra
    }

    pub fn atom_transient_mut(&mut self, idx: AtomIndex) -> &mut Vec<String> {
        &mut self.atom_mut(idx).transient
    }

    pub fn bond_extra_mut(&mut self, idx: BondIndex) -> &mut Vec<String> {
        self.check_bond(idx);
        &mut self.bonds[idx.slot()].extra
    }

    pub fn set_bond_order(&mut self, idx: BondIndex, order: u8) {
        self.check_bond(idx);
        self.bonds[idx.slot()].order = order;
        self.ring_shape_changed();
    }

    pub fn set_bond_type(&mut self, idx: BondIndex, kind: BondType) {
        self.check_bond(idx);
        self.bonds[idx.slot()].kind = kind;
        self.ring_shape_changed();
    }

    fn atom_mut(&mut self, idx: AtomIndex) -> &mut Atom {
        self.check_atom(idx);
        &mut self.atoms[idx.slot()]
    }

    // ---- derived queries ----

    pub fn atom_adj_list(&self, idx: AtomIndex) -> &[AtomIndex] {
        self.check_atom(idx);
        &self.adjacency().atoms[idx.slot()]
    }

    pub fn atom_adj_bonds(&self, idx: AtomIndex) -> &[BondIndex] {
        self.check_atom(idx);
        &self.adjacency().bonds[idx.slot()]
    }

    pub fn atom_adj_count(&self, idx: AtomIndex) -> usize {
        self.atom_adj_list(idx).len()
    }

    pub fn find_bond(&self, a: AtomIndex, b: AtomIndex) -> Option<BondIndex> {
        self.atom_adj_bonds(a)
            .iter()
            .copied()
            .find(|&bond| self.bonds[bond.slot()].touches(b))
    }

    /// The endpoint of `bond` that is not `atom`.
    pub fn bond_other(&self, bond: BondIndex, atom: AtomIndex) -> AtomIndex {
        let b = self.bond(bond);
        if b.from == atom { b.to } else { b.from }
    }

    /// Fused ring system id for the atom; 0 when it is on no cycle.
    pub fn atom_ring_block(&self, idx: AtomIndex) -> usize {
        self.check_atom(idx);
        let version = self.version;
        let blocks = self.cache.ring_blocks.get_or_init(|| Versioned {
            version,
            value: graph::ring_blocks(self.atoms.len(), self.adjacency()),
        });
        debug_assert_eq!(blocks.version, self.version);
        blocks.value[idx.slot()]
    }

    /// Connected component id, starting from 1.
    pub fn atom_conn_comp(&self, idx: AtomIndex) -> usize {
        self.check_atom(idx);
        self.components()[idx.slot()]
    }

    pub fn num_components(&self) -> usize {
        self.components().iter().copied().max().unwrap_or(0)
    }

    pub fn bond_in_ring(&self, idx: BondIndex) -> bool {
        let bond = self.bond(idx);
        let block = self.atom_ring_block(bond.from);
        block > 0 && block == self.atom_ring_block(bond.to)
    }

    /// Minimal rings of exactly `size` atoms, each listed in bond order,
    /// starting from its lowest atom index.
    pub fn find_rings_of_size(&self, size: usize) -> &[Vec<AtomIndex>] {
        assert!(RING_SIZES.contains(&size), "ring size {size} outside 3..=7");
        let version = self.version;
        let cell = &self.cache.rings[size - 3];
        let rings = cell.get_or_init(|| {
            let blocks: Vec<usize> = self.atom_indices().map(|a| self.atom_ring_block(a)).collect();
            Versioned {
                version,
                value: rings::find_rings(size, self.adjacency(), &blocks),
            }
        });
        debug_assert_eq!(rings.version, self.version);
        &rings.value
    }

    pub fn atomic_number(&self, idx: AtomIndex) -> Option<usize> {
        atomic_number(&self.atom(idx).element)
    }

    /// Min/max atom coordinates as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let first = self.atoms.first()?;
        let mut bounds = (first.x, first.y, first.x, first.y);
        for atom in &self.atoms[1..] {
            bounds.0 = bounds.0.min(atom.x);
            bounds.1 = bounds.1.min(atom.y);
            bounds.2 = bounds.2.max(atom.x);
            bounds.3 = bounds.3.max(atom.y);
        }
        Some(bounds)
    }

    fn adjacency(&self) -> &Adjacency {
        let version = self.version;
        let adjacency = self.cache.adjacency.get_or_init(|| Versioned {
            version,
            value: Adjacency::build(self.atoms.len(), &self.bonds),
        });
        debug_assert_eq!(adjacency.version, self.version);
        &adjacency.value
    }

    fn components(&self) -> &[usize] {
        let version = self.version;
        let components = self.cache.components.get_or_init(|| Versioned {
            version,
            value: graph::connected_components(self.atoms.len(), self.adjacency()),
        });
        debug_assert_eq!(components.version, self.version);
        &components.value
    }

    fn structure_changed(&mut self) {
        self.version += 1;
        self.cache = DerivedCache::default();
    }

    fn ring_shape_changed(&mut self) {
        self.cache.rings = Default::default();
    }

    fn check_atom(&self, idx: AtomIndex) {
        assert!(
            idx.get() <= self.atoms.len(),
            "atom index {} out of range (molecule has {} atoms)",
            idx,
            self.atoms.len()
        );
    }

    fn check_bond(&self, idx: BondIndex) {
        assert!(
            idx.get() <= self.bonds.len(),
            "bond index {} out of range (molecule has {} bonds)",
            idx,
            self.bonds.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Molecule {
        let mut mol = Molecule::new();
        let mut prev = None;
        for i in 0..n {
            let atom = mol.add_atom("C", i as f32 * 1.5, 0.0);
            if let Some(prev) = prev {
                mol.add_bond(prev, atom, 1);
            }
            prev = Some(atom);
        }
        mol
    }

    #[test]
    fn add_returns_one_based_indices() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("O", 1.2, 0.0);
        let bond = mol.add_bond(a, b, 2);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(bond.get(), 1);
        assert_eq!(mol.bond(bond).order, 2);
    }

    #[test]
    fn delete_atom_renumbers_bonds() {
        let mut mol = chain(5);
        mol.delete_atom_and_bonds(AtomIndex::new(3)).unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 2);
        let ends: Vec<_> = mol.bonds().map(|(_, b)| (b.from.get(), b.to.get())).collect();
        assert_eq!(ends, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn delete_atom_out_of_range_fails() {
        let mut mol = chain(2);
        let err = mol.delete_atom_and_bonds(AtomIndex::new(3)).unwrap_err();
        assert_eq!(err, MoleculeError::AtomOutOfRange { index: 3, count: 2 });
    }

    #[test]
    fn add_then_delete_last_restores_counts() {
        let mut mol = chain(4);
        let last = AtomIndex::new(4);
        let extra = mol.add_atom("N", 3.0, 1.0);
        mol.add_bond(last, extra, 1);
        mol.delete_atom_and_bonds(extra).unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
    }

    #[test]
    fn structural_edit_invalidates_adjacency() {
        let mut mol = chain(3);
        let a1 = AtomIndex::new(1);
        assert_eq!(mol.atom_adj_count(a1), 1);
        let version = mol.version();
        mol.add_bond(a1, AtomIndex::new(3), 1);
        assert!(mol.version() > version);
        assert_eq!(mol.atom_adj_count(a1), 2);
        assert_eq!(mol.atom_ring_block(a1), 1);
    }

    #[test]
    fn order_edit_keeps_structure_version() {
        let mut mol = chain(3);
        let version = mol.version();
        mol.set_bond_order(BondIndex::new(1), 2);
        assert_eq!(mol.version(), version);
        assert_eq!(mol.bond(BondIndex::new(1)).order, 2);
    }

    #[test]
    fn find_bond_and_other_end() {
        let mol = chain(3);
        let (a, b, c) = (AtomIndex::new(1), AtomIndex::new(2), AtomIndex::new(3));
        let bond = mol.find_bond(b, c).unwrap();
        assert_eq!(bond.get(), 2);
        assert_eq!(mol.bond_other(bond, c), b);
        assert_eq!(mol.find_bond(a, c), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_access_panics() {
        let mol = chain(2);
        let _ = mol.atom(AtomIndex::new(7));
    }

    #[test]
    #[should_panic(expected = "endpoints must differ")]
    fn self_loop_panics() {
        let mut mol = chain(2);
        mol.add_bond(AtomIndex::new(1), AtomIndex::new(1), 1);
    }

    #[test]
    fn warmed_molecule_is_shareable() {
        fn assert_sync<T: Sync + Send>(_: &T) {}
        let mol = chain(3);
        let _ = mol.atom_ring_block(AtomIndex::new(1));
        assert_sync(&mol);
    }
}
