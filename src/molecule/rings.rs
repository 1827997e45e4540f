use super::graph::Adjacency;
use super::types::AtomIndex;

/// Enumerates minimal rings of `size` atoms.
///
/// Paths are grown with an explicit stack from each ring-block atom,
/// visiting only higher-numbered atoms of the same block, so each ring is
/// reached from its lowest atom. A closed path is a ring only if every
/// member has exactly two neighbours inside the path (no chords).
pub(super) fn find_rings(size: usize, adj: &Adjacency, blocks: &[usize]) -> Vec<Vec<AtomIndex>> {
    let mut found: Vec<Vec<AtomIndex>> = Vec::new();
    let atom_count = blocks.len();
    let mut in_path = vec![false; atom_count];

    for start in 0..atom_count {
        let block = blocks[start];
        if block == 0 {
            continue;
        }
        let mut path: Vec<usize> = vec![start];
        let mut cursors: Vec<usize> = vec![0];
        in_path[start] = true;

        while let Some(&tip) = path.last() {
            let depth = path.len();
            let cursor = cursors[depth - 1];
            let Some(nb) = adj.atoms[tip].get(cursor).map(|a| a.slot()) else {
                in_path[tip] = false;
                path.pop();
                cursors.pop();
                continue;
            };
            cursors[depth - 1] += 1;

            if depth == size {
                if nb == start && is_minimal(&path, adj, &in_path) {
                    let ring = canonical(&path);
                    if !found.contains(&ring) {
                        found.push(ring);
                    }
                }
                continue;
            }
            if nb <= start || in_path[nb] || blocks[nb] != block {
                continue;
            }
            in_path[nb] = true;
            path.push(nb);
            cursors.push(0);
        }
    }
    found
}

fn is_minimal(path: &[usize], adj: &Adjacency, in_path: &[bool]) -> bool {
    path.iter().all(|&slot| {
        adj.atoms[slot]
            .iter()
            .filter(|nb| in_path[nb.slot()])
            .count()
            == 2
    })
}

/// Rotates the ring to start at its lowest atom and picks the direction
/// whose second atom is the smaller of the two neighbours.
fn canonical(path: &[usize]) -> Vec<AtomIndex> {
    let n = path.len();
    let lowest = (0..n).min_by_key(|&i| path[i]).unwrap_or(0);
    let forward = path[(lowest + 1) % n];
    let backward = path[(lowest + n - 1) % n];
    (0..n)
        .map(|k| {
            let i = if forward <= backward {
                (lowest + k) % n
            } else {
                (lowest + n - k) % n
            };
            AtomIndex::from_slot(path[i])
        })
        .collect()
}
