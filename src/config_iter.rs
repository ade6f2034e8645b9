use std::collections::HashSet;

use itertools::Itertools;

use crate::aggregator::{binomial, empty_outcome, EnumOutcome};
use crate::hole::HoleId;
use crate::store::ConstraintStore;

/// Naive oracle kernel: enumerates every raw cell configuration over
/// `constrained_unopened` directly, checking each one against every active
/// `Constraint`.
///
/// This is exponential in the number of constrained holes and exists to
/// validate the fast partition kernel (`partition_iter`), not for production
/// use on boards of any real size.
pub fn enumerate(store: &ConstraintStore) -> EnumOutcome {
    let cell_count = store.geometry().cell_count();
    let constrained: Vec<HoleId> = store.constrained_unopened().iter().copied().collect();
    let unconstrained_len = store.unconstrained_unopened().len();
    let known_bad_len = store.known_bad_count();
    let total_bads = store.total_bads() as usize;

    let remaining_budget = match total_bads.checked_sub(known_bad_len) {
        Some(r) => r,
        None => return empty_outcome(cell_count),
    };
    let lo = remaining_budget.saturating_sub(unconstrained_len);
    let hi = remaining_budget.min(constrained.len());
    if lo > hi {
        return empty_outcome(cell_count);
    }

    let mut outcome = empty_outcome(cell_count);
    let active: Vec<_> = store.constraints().active().collect();

    for w in lo..=hi {
        let sunken_bads = remaining_budget - w;
        let ways = binomial(unconstrained_len, sunken_bads);
        if ways == 0.0 {
            continue;
        }

        for combo in constrained.iter().copied().combinations(w) {
            outcome.iterations += 1;
            let bad_here: HashSet<HoleId> = combo.iter().copied().collect();
            let legal = active.iter().all(|(_, c)| {
                let count = c.holes.iter().filter(|h| bad_here.contains(h)).count();
                count == c.remaining as usize
            });
            if !legal {
                continue;
            }
            outcome.legal_iterations += 1;
            outcome.total_weight += ways;
            for &h in &combo {
                outcome.bad_weight[h.0 as usize] += ways;
            }
            if unconstrained_len > 0 && sunken_bads > 0 {
                let per_cell = ways * (sunken_bads as f64 / unconstrained_len as f64);
                for &h in store.unconstrained_unopened() {
                    outcome.bad_weight[h.0 as usize] += per_cell;
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellState;
    use crate::hole::Geometry;

    #[test]
    fn three_in_a_row_clue_two_forces_both_ends_bad() {
        let geo = Geometry::new(3, 1);
        let mut store = ConstraintStore::new(geo, 2);
        store.set_cell(1, 0, CellState::Clue(2));
        // the store's own eager propagation already resolves this one, but
        // the oracle kernel should agree when run over what constraints
        // remain active.
        let outcome = enumerate(&store);
        assert!(outcome.total_weight > 0.0 || store.known_bad_count() == 2);
    }
}
