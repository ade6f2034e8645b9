use std::collections::HashMap;

use itertools::izip;

use crate::aggregator::{binomial, empty_outcome, EnumOutcome};
use crate::constraint::ConstraintId;
use crate::hole::HoleId;
use crate::partition::Partition;
use crate::store::ConstraintStore;

/// Instead of iterating every raw assignment, each partition only needs
/// *how many* of its interchangeable holes are bad, so the search space is
/// one dimension per partition rather than one per hole.
struct CartesianProduct<T> {
    curr: Vec<usize>,
    basis: Vec<Vec<T>>,
}

impl<T> CartesianProduct<T> {
    fn new(basis: impl IntoIterator<Item = impl IntoIterator<Item = T>>) -> Self {
        let basis: Vec<Vec<T>> = basis.into_iter().map(|v| v.into_iter().collect()).collect();
        Self {
            curr: vec![0; basis.len()],
            basis,
        }
    }
}

impl<T: Copy> Iterator for CartesianProduct<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.curr.is_empty() {
            return None;
        }
        let ret = Some(
            self.curr
                .iter()
                .enumerate()
                .map(|(i, val)| self.basis[i][*val])
                .collect(),
        );

        for (val, v) in izip!(self.curr.iter_mut(), self.basis.iter()) {
            *val += 1;
            if *val != v.len() {
                return ret;
            }
            *val = 0;
        }

        // every combination generated; stop on the next call
        self.curr.clear();

        ret
    }
}

/// Fast partition kernel: enumerates bad-count tuples across the
/// *constrained* partitions only. The sunken partition (empty imposing set)
/// never participates in the cartesian product -- its bad-count is derived
/// as the slack `B - Σ b_i` left over from whatever the constrained
/// partitions chose, and its weight/marginal contribution is folded in
/// alongside each tuple rather than iterated. Each constrained tuple entry
/// is "how many holes in this partition are bad", weighted by
/// `binomial(len, k)` since the holes within a partition are interchangeable.
pub fn enumerate(store: &ConstraintStore, partitions: &[Partition]) -> EnumOutcome {
    let cell_count = store.geometry().cell_count();
    if partitions.is_empty() {
        return empty_outcome(cell_count);
    }

    let known_bad_len = store.known_bad_count();
    let total_bads = store.total_bads() as usize;
    let remaining_budget = match total_bads.checked_sub(known_bad_len) {
        Some(r) => r,
        None => return empty_outcome(cell_count),
    };

    let (sunken, constrained_partitions): (Vec<&Partition>, Vec<&Partition>) =
        partitions.iter().partition(|p| p.is_sunken());
    let sunken_len: usize = sunken.iter().map(|p| p.len()).sum();
    let sunken_holes: Vec<_> = sunken.iter().flat_map(|p| p.holes.iter().copied()).collect();

    let active: Vec<_> = store.constraints().active().collect();
    let mut constraint_partitions: HashMap<ConstraintId, Vec<usize>> = HashMap::new();
    for (p_idx, p) in constrained_partitions.iter().enumerate() {
        for &cid in &p.imposing {
            constraint_partitions.entry(cid).or_default().push(p_idx);
        }
    }

    let mut outcome = empty_outcome(cell_count);

    if constrained_partitions.is_empty() {
        // Nothing to enumerate: the whole budget is slack against the
        // sunken partition (or there is no sunken partition either, in
        // which case `binomial` below naturally yields zero unless
        // `remaining_budget` is itself zero).
        outcome.iterations += 1;
        let weight = binomial(sunken_len, remaining_budget);
        if weight > 0.0 {
            outcome.legal_iterations += 1;
            outcome.total_weight += weight;
            fold_sunken(&mut outcome, weight, remaining_budget, sunken_len, &sunken_holes);
        }
        return outcome;
    }

    let basis: Vec<Vec<usize>> = constrained_partitions
        .iter()
        .map(|p| (0..=p.len()).collect())
        .collect();

    for tuple in CartesianProduct::new(basis) {
        outcome.iterations += 1;

        let total: usize = tuple.iter().sum();
        let b_sunken = match remaining_budget.checked_sub(total) {
            Some(b) if b <= sunken_len => b,
            _ => continue, // over budget, or more slack than the sunken bucket holds
        };

        let legal = active.iter().all(|(cid, c)| {
            let sum: usize = constraint_partitions
                .get(cid)
                .map(|idxs| idxs.iter().map(|&i| tuple[i]).sum())
                .unwrap_or(0);
            sum == c.remaining as usize
        });
        if !legal {
            continue;
        }
        outcome.legal_iterations += 1;

        let weight: f64 = binomial(sunken_len, b_sunken)
            * tuple
                .iter()
                .zip(constrained_partitions.iter())
                .map(|(&k, p)| binomial(p.len(), k))
                .product::<f64>();
        if weight == 0.0 {
            continue;
        }
        outcome.total_weight += weight;

        for (&k, p) in tuple.iter().zip(constrained_partitions.iter()) {
            if p.is_empty() || k == 0 {
                continue;
            }
            let per_cell = weight * (k as f64 / p.len() as f64);
            for &h in &p.holes {
                outcome.bad_weight[h.0 as usize] += per_cell;
            }
        }

        fold_sunken(&mut outcome, weight, b_sunken, sunken_len, &sunken_holes);
    }

    outcome
}

/// Adds a tuple's sunken-partition contribution to the aggregator: each
/// sunken hole's marginal is weight × badness / |holes|, folded per-tuple
/// rather than computed once from the grand total, as the enumeration
/// proceeds.
fn fold_sunken(
    outcome: &mut EnumOutcome,
    weight: f64,
    b_sunken: usize,
    sunken_len: usize,
    sunken_holes: &[HoleId],
) {
    if b_sunken == 0 || sunken_len == 0 {
        return;
    }
    let per_cell = weight * (b_sunken as f64 / sunken_len as f64);
    for &h in sunken_holes {
        outcome.bad_weight[h.0 as usize] += per_cell;
    }
}
