use super::element::default_valence;
use super::{AtomIndex, Molecule};

impl Molecule {
    /// Hydrogen count for the atom: the explicit count when one is set,
    /// otherwise the default valence (C, N, O, S, P only) adjusted for
    /// charge and unpaired electrons, less the incident bond orders.
    pub fn atom_hydrogens(&self, idx: AtomIndex) -> u8 {
        let atom = self.atom(idx);
        if let Some(explicit) = atom.hydrogens {
            return explicit;
        }
        self.implicit_hydrogens(idx)
    }

    /// Valence-derived hydrogen count, ignoring any explicit setting.
    pub fn implicit_hydrogens(&self, idx: AtomIndex) -> u8 {
        let atom = self.atom(idx);
        let Some(valence) = default_valence(&atom.element) else {
            return 0;
        };
        // Carbon loses a hydrogen for either sign of charge; the others
        // gain one per positive charge and lose one per negative charge.
        let charge = if atom.element == "C" {
            -atom.charge.abs()
        } else {
            atom.charge
        };
        let bonded: i32 = self
            .atom_adj_bonds(idx)
            .iter()
            .map(|&b| i32::from(self.bond(b).order))
            .sum();
        let count = valence + charge - i32::from(atom.unpaired) - bonded;
        count.clamp(0, i32::from(u8::MAX)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methanol_hydrogens() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let o = mol.add_atom("O", 1.4, 0.0);
        mol.add_bond(c, o, 1);
        assert_eq!(mol.atom_hydrogens(c), 3);
        assert_eq!(mol.atom_hydrogens(o), 1);
    }

    #[test]
    fn charge_adjusts_valence() {
        let mut mol = Molecule::new();
        let n = mol.add_atom("N", 0.0, 0.0);
        mol.set_atom_charge(n, 1);
        assert_eq!(mol.atom_hydrogens(n), 4);
        let o = mol.add_atom("O", 2.0, 0.0);
        mol.set_atom_charge(o, -1);
        assert_eq!(mol.atom_hydrogens(o), 1);
        let c = mol.add_atom("C", 4.0, 0.0);
        mol.set_atom_charge(c, 1);
        assert_eq!(mol.atom_hydrogens(c), 3);
        mol.set_atom_charge(c, -1);
        assert_eq!(mol.atom_hydrogens(c), 3);
    }

    #[test]
    fn radicals_and_multiple_bonds() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        let o = mol.add_atom("O", 1.2, 0.0);
        mol.add_bond(c, o, 2);
        mol.set_atom_unpaired(c, 1);
        assert_eq!(mol.atom_hydrogens(c), 1);
        assert_eq!(mol.atom_hydrogens(o), 0);
    }

    #[test]
    fn explicit_count_wins_and_floor_is_zero() {
        let mut mol = Molecule::new();
        let c = mol.add_atom("C", 0.0, 0.0);
        mol.set_atom_hydrogens(c, Some(1));
        assert_eq!(mol.atom_hydrogens(c), 1);
        let n = mol.add_atom("N", 1.5, 0.0);
        for i in 0..4 {
            let sub = mol.add_atom("C", 1.5, i as f32);
            mol.add_bond(n, sub, 1);
        }
        assert_eq!(mol.atom_hydrogens(n), 0);
        assert_eq!(mol.atom_hydrogens(mol.atom_indices().last().unwrap()), 3);
        let cl = mol.add_atom("Cl", 9.0, 0.0);
        assert_eq!(mol.atom_hydrogens(cl), 0);
    }
}
