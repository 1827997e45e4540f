use super::types::{AtomIndex, Bond, BondIndex};

#[derive(Debug, Clone, Default)]
pub(super) struct Adjacency {
    pub atoms: Vec<Vec<AtomIndex>>,
    pub bonds: Vec<Vec<BondIndex>>,
}

impl Adjacency {
    pub fn build(atom_count: usize, bonds: &[Bond]) -> Self {
        let mut atoms = vec![Vec::new(); atom_count];
        let mut incident = vec![Vec::new(); atom_count];
        for (slot, bond) in bonds.iter().enumerate() {
            let idx = BondIndex::from_slot(slot);
            atoms[bond.from.slot()].push(bond.to);
            atoms[bond.to.slot()].push(bond.from);
            incident[bond.from.slot()].push(idx);
            incident[bond.to.slot()].push(idx);
        }
        Self {
            atoms,
            bonds: incident,
        }
    }
}

/// Labels each atom with a component id (1-based) by repeated frontier
/// expansion, opening a new component whenever the frontier runs dry.
pub(super) fn connected_components(atom_count: usize, adj: &Adjacency) -> Vec<usize> {
    let mut comp = vec![0usize; atom_count];
    let mut next_id = 0usize;
    let mut frontier: Vec<usize> = Vec::new();
    for seed in 0..atom_count {
        if comp[seed] != 0 {
            continue;
        }
        next_id += 1;
        comp[seed] = next_id;
        frontier.clear();
        frontier.push(seed);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for &slot in &frontier {
                for nb in &adj.atoms[slot] {
                    if comp[nb.slot()] == 0 {
                        comp[nb.slot()] = next_id;
                        next.push(nb.slot());
                    }
                }
            }
            frontier = next;
        }
    }
    comp
}

/// Tags every atom that sits on a cycle with the id of its fused ring
/// system. Cycles are found with one depth-first walk: meeting a visited
/// atom still on the path stack closes a cycle, and everything on the stack
/// from that atom upward is merged into a single (temporarily negative)
/// block. Atoms on no cycle keep 0.
pub(super) fn ring_blocks(atom_count: usize, adj: &Adjacency) -> Vec<usize> {
    let mut block = vec![0i64; atom_count];
    let mut visited = vec![false; atom_count];
    let mut on_path = vec![false; atom_count];
    let mut next_block = 0i64;

    for root in 0..atom_count {
        if visited[root] {
            continue;
        }
        // Frames are (atom slot, parent slot, cursor into the neighbour list).
        let mut path: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        visited[root] = true;
        on_path[root] = true;

        while let Some(frame) = path.last_mut() {
            let (slot, parent, cursor) = *frame;
            let Some(nb) = adj.atoms[slot].get(cursor) else {
                on_path[slot] = false;
                path.pop();
                continue;
            };
            frame.2 += 1;
            let nb = nb.slot();
            if Some(nb) == parent {
                continue;
            }
            if !visited[nb] {
                visited[nb] = true;
                on_path[nb] = true;
                path.push((nb, Some(slot), 0));
                continue;
            }
            if !on_path[nb] {
                continue;
            }

            let start = path.iter().rposition(|(s, _, _)| *s == nb).unwrap_or(0);
            let members: Vec<usize> = path[start..].iter().map(|(s, _, _)| *s).collect();
            next_block -= 1;
            let merged: Vec<i64> = members
                .iter()
                .map(|&m| block[m])
                .filter(|&id| id != 0)
                .collect();
            if !merged.is_empty() {
                for id in block.iter_mut() {
                    if merged.contains(id) {
                        *id = next_block;
                    }
                }
            }
            for m in members {
                block[m] = next_block;
            }
        }
    }

    // Flip to positive ids, numbered by first appearance.
    let mut mapping: Vec<(i64, usize)> = Vec::new();
    block
        .into_iter()
        .map(|id| {
            if id == 0 {
                return 0;
            }
            if let Some((_, positive)) = mapping.iter().find(|(neg, _)| *neg == id) {
                return *positive;
            }
            let positive = mapping.len() + 1;
            mapping.push((id, positive));
            positive
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::Molecule;
    use super::super::types::AtomIndex;

    fn ring(mol: &mut Molecule, size: usize, cx: f32) -> Vec<AtomIndex> {
        let atoms: Vec<AtomIndex> = (0..size)
            .map(|i| {
                let theta = i as f32 * std::f32::consts::TAU / size as f32;
                mol.add_atom("C", cx + 1.5 * theta.cos(), 1.5 * theta.sin())
            })
            .collect();
        for i in 0..size {
            mol.add_bond(atoms[i], atoms[(i + 1) % size], 1);
        }
        atoms
    }

    #[test]
    fn chain_atoms_have_no_block() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("C", 0.0, 0.0);
        let b = mol.add_atom("C", 1.5, 0.0);
        mol.add_bond(a, b, 1);
        assert_eq!(mol.atom_ring_block(a), 0);
        assert_eq!(mol.atom_ring_block(b), 0);
    }

    #[test]
    fn biphenyl_has_two_blocks() {
        let mut mol = Molecule::new();
        let left = ring(&mut mol, 6, 0.0);
        let right = ring(&mut mol, 6, 6.0);
        mol.add_bond(left[0], right[3], 1);
        let first = mol.atom_ring_block(left[0]);
        let second = mol.atom_ring_block(right[0]);
        assert_ne!(first, 0);
        assert_ne!(second, 0);
        assert_ne!(first, second);
        assert!(left.iter().all(|&a| mol.atom_ring_block(a) == first));
        assert!(right.iter().all(|&a| mol.atom_ring_block(a) == second));
    }

    #[test]
    fn fused_rings_share_a_block() {
        let mut mol = Molecule::new();
        let first = ring(&mut mol, 6, 0.0);
        let extra: Vec<AtomIndex> = (0..4)
            .map(|i| mol.add_atom("C", 3.0 + i as f32, 2.0))
            .collect();
        mol.add_bond(first[0], extra[0], 1);
        for pair in extra.windows(2) {
            mol.add_bond(pair[0], pair[1], 1);
        }
        mol.add_bond(extra[3], first[1], 1);
        let id = mol.atom_ring_block(first[0]);
        assert_ne!(id, 0);
        for atom in mol.atom_indices() {
            assert_eq!(mol.atom_ring_block(atom), id);
        }
    }

    #[test]
    fn ring_with_tail() {
        let mut mol = Molecule::new();
        let atoms = ring(&mut mol, 5, 0.0);
        let tail = mol.add_atom("O", 3.0, 0.0);
        mol.add_bond(atoms[0], tail, 1);
        assert_eq!(mol.atom_ring_block(tail), 0);
        assert_eq!(mol.atom_ring_block(atoms[2]), 1);
    }

    #[test]
    fn components_are_counted() {
        let mut mol = Molecule::new();
        let a = mol.add_atom("Na", 0.0, 0.0);
        let b = mol.add_atom("Cl", 3.0, 0.0);
        let c = mol.add_atom("C", 6.0, 0.0);
        let d = mol.add_atom("O", 7.5, 0.0);
        mol.add_bond(c, d, 1);
        assert_eq!(mol.num_components(), 3);
        assert_eq!(mol.atom_conn_comp(a), 1);
        assert_eq!(mol.atom_conn_comp(b), 2);
        assert_eq!(mol.atom_conn_comp(c), mol.atom_conn_comp(d));
    }
}
