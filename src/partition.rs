use std::collections::HashMap;

use crate::constraint::ConstraintId;
use crate::hole::HoleId;
use crate::store::{imposing_set_key, ConstraintStore, ImposingKey};

/// A group of unopened holes that are indistinguishable under every live
/// `Constraint`: every hole in a `Partition` imposes (and is imposed on by)
/// exactly the same set of constraints, so any legal bad-count assignment
/// treats them interchangeably.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Constraints whose `holes` list contains every member of this
    /// partition. Empty for the sunken partition.
    pub imposing: Vec<ConstraintId>,
    pub holes: Vec<HoleId>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// Whether this is the sunken partition: cells touched by no live
    /// constraint, interchangeable with each other purely on budget grounds.
    pub fn is_sunken(&self) -> bool {
        self.imposing.is_empty()
    }
}

/// Rebuilds the partition list from a `ConstraintStore`'s current
/// `constrained_unopened` and `unconstrained_unopened` sets.
///
/// Holes are grouped by the hash of their sorted imposing-constraint list,
/// which makes this an O(P) rebuild where P is the number of unopened holes,
/// rather than an O(P^2) pairwise set-comparison.
///
/// The sunken partition (no imposing constraints at all) is always present
/// first when any unconstrained holes exist, matching the convention that
/// the "slack" group is index 0 throughout the aggregator and benchmark.
pub fn rebuild(store: &ConstraintStore) -> Vec<Partition> {
    let mut by_key: HashMap<ImposingKey, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    let unconstrained = store.unconstrained_unopened();
    if !unconstrained.is_empty() {
        partitions.push(Partition {
            imposing: Vec::new(),
            holes: unconstrained.iter().copied().collect(),
        });
        by_key.insert(Vec::new(), 0);
    }

    for &hole in store.constrained_unopened() {
        let key = imposing_set_key(store.imposing_set(hole));
        match by_key.get(&key) {
            Some(&idx) => partitions[idx].holes.push(hole),
            None => {
                let idx = partitions.len();
                by_key.insert(key.clone(), idx);
                partitions.push(Partition {
                    imposing: key,
                    holes: vec![hole],
                });
            }
        }
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellState;
    use crate::hole::Geometry;

    #[test]
    fn two_clues_sharing_a_hole_form_one_partition() {
        // 3x1 board, two overlapping clues would need a wider board; use a
        // 3x2 board so (1,0) and (1,1) can both see a shared unopened cell.
        let geo = Geometry::new(3, 2);
        let mut store = ConstraintStore::new(geo, 2);
        store.set_cell(0, 0, CellState::Clue(1));
        store.set_cell(0, 1, CellState::Clue(1));

        let partitions = rebuild(&store);
        // every unopened hole neighboring both clues falls in one partition
        // per shared imposing set, plus whatever sunken holes remain.
        assert!(partitions.iter().any(|p| !p.is_sunken() && !p.is_empty()));
    }

    #[test]
    fn no_constraints_yields_one_sunken_partition() {
        let geo = Geometry::new(2, 2);
        let store = ConstraintStore::new(geo, 1);
        let partitions = rebuild(&store);
        assert_eq!(partitions.len(), 1);
        assert!(partitions[0].is_sunken());
        assert_eq!(partitions[0].len(), 4);
    }
}
