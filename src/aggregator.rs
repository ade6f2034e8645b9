use crate::hole::HoleId;
use crate::store::ConstraintStore;

/// Incremental double-precision binomial coefficient: avoids the integer
/// overflow a direct `n!/(k!(n-k)!)` computation hits once board sizes grow
/// past a couple hundred cells, at the cost of float rounding that is
/// negligible for marginal probabilities.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 1.0f64;
    for i in 0..k {
        r *= (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// Shared result shape for both enumeration kernels: the un-normalized
/// weighted bad count per hole, plus the partition function (`total_weight`)
/// used to turn weights into probabilities.
pub struct EnumOutcome {
    pub total_weight: f64,
    pub bad_weight: Vec<f64>,
    pub iterations: u64,
    pub legal_iterations: u64,
}

impl EnumOutcome {
    fn empty(cell_count: usize) -> Self {
        Self {
            total_weight: 0.0,
            bad_weight: vec![0.0; cell_count],
            iterations: 0,
            legal_iterations: 0,
        }
    }
}

/// Outcome of folding an `EnumOutcome` back into the store: either a
/// finished probability assignment, or a signal that the current
/// constraints admit no legal configuration at all.
pub enum Finalized {
    Probabilities,
    Unsatisfiable,
}

/// Validates and folds an `EnumOutcome` into `store`'s probability vector.
///
/// `total_weight == 0` means no legal bad-count assignment exists under the
/// current constraints -- an unsatisfiable board, which the caller recovers
/// from by resetting and replaying.
pub fn finalize(store: &mut ConstraintStore, outcome: &EnumOutcome) -> Finalized {
    if outcome.total_weight <= 0.0 {
        return Finalized::Unsatisfiable;
    }

    let probs = store.probabilities_mut();
    for (i, p) in probs.iter_mut().enumerate() {
        *p = outcome.bad_weight[i] / outcome.total_weight;
    }

    // Forced cells discovered only through full enumeration (every legal
    // configuration agrees): fold them into the known-bad/known-safe sets so
    // future reveals and partitions no longer carry them as live unknowns.
    let forced_bad: Vec<HoleId> = store
        .constrained_unopened()
        .iter()
        .copied()
        .chain(store.unconstrained_unopened().iter().copied())
        .filter(|h| store.probability(*h) >= 1.0 - f64::EPSILON)
        .collect();
    let forced_safe: Vec<HoleId> = store
        .constrained_unopened()
        .iter()
        .copied()
        .chain(store.unconstrained_unopened().iter().copied())
        .filter(|h| store.probability(*h) <= f64::EPSILON)
        .collect();

    for h in forced_bad {
        store.mark_bad(h);
    }
    for h in forced_safe {
        store.mark_safe(h);
    }

    Finalized::Probabilities
}

pub(crate) fn empty_outcome(cell_count: usize) -> EnumOutcome {
    EnumOutcome::empty(cell_count)
}
