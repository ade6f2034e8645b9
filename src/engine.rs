use crate::aggregator::{self, Finalized};
use crate::cell::CellState;
use crate::error::EngineError;
use crate::hole::{Geometry, HoleId};
use crate::partition;
use crate::partition_iter;
use crate::store::ConstraintStore;

/// Per-`recompute()` counters, reported as a tab-separated diagnostic line:
/// total weight, total iterations, legal iterations, partitions, sunken
/// partitions, constrained cells.
#[derive(Copy, Clone, Debug, Default)]
pub struct Diagnostics {
    pub total_weight: f64,
    pub total_iterations: u64,
    pub legal_iterations: u64,
    pub partitions: usize,
    pub sunken_partitions: usize,
    pub constrained_cells: usize,
}

enum Outcome {
    Ok(Diagnostics),
    Unsatisfiable,
}

/// Façade over the constraint store and enumeration kernels: `reveal` records
/// a dig and recomputes marginals in one step, recovering from any
/// inconsistency by resetting and replaying.
pub struct Engine {
    store: ConstraintStore,
    last_diagnostics: Diagnostics,
}

impl Engine {
    pub fn new(width: u8, height: u8, total_bads: u16) -> Result<Self, EngineError> {
        let geo = Geometry::new(width, height);
        if total_bads as usize > geo.cell_count() {
            return Err(EngineError::BadBudgetExceeded);
        }
        let mut engine = Self {
            store: ConstraintStore::new(geo, total_bads),
            last_diagnostics: Diagnostics::default(),
        };
        engine.recompute()?;
        Ok(engine)
    }

    pub fn geometry(&self) -> Geometry {
        self.store.geometry()
    }

    pub fn total_bads(&self) -> u16 {
        self.store.total_bads()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.last_diagnostics
    }

    /// Records a reveal and recomputes marginals. On any conflict -- the
    /// reveal contradicts an earlier one, over-budgets the bad count, or
    /// leaves the constraints with no legal configuration -- the engine
    /// reverts this reveal, replays every earlier one, and reports the board
    /// as unsatisfiable.
    pub fn reveal(&mut self, x: u8, y: u8, state: CellState) -> Result<Diagnostics, EngineError> {
        let geo = self.store.geometry();
        if !geo.in_bounds(x, y) {
            return Err(EngineError::OutOfBounds { x, y });
        }
        let hole = geo.hole_of(x, y);

        self.store.set_cell(x, y, state);
        if self.store.take_conflict() {
            self.store.revert_and_replay(hole);
            self.restore_after_revert();
            return Err(EngineError::Unsatisfiable);
        }

        match self.run_recompute() {
            Outcome::Ok(diag) => Ok(diag),
            Outcome::Unsatisfiable => {
                self.store.revert_and_replay(hole);
                self.restore_after_revert();
                Err(EngineError::Unsatisfiable)
            }
        }
    }

    /// After rolling back to the last known-good board, the store's
    /// probability vector reflects a just-reset (all-zero) state rather
    /// than the marginals that held before the rejected reveal; recompute
    /// once more so callers immediately see a valid distribution again.
    fn restore_after_revert(&mut self) {
        let _ = self.run_recompute();
    }

    /// Re-runs the partition/enumeration/aggregation pipeline without
    /// recording a new reveal. Exposed for callers (e.g. the benchmark
    /// binary) that want fresh diagnostics without changing board state.
    pub fn recompute(&mut self) -> Result<Diagnostics, EngineError> {
        match self.run_recompute() {
            Outcome::Ok(diag) => Ok(diag),
            Outcome::Unsatisfiable => Err(EngineError::Unsatisfiable),
        }
    }

    fn run_recompute(&mut self) -> Outcome {
        let partitions = partition::rebuild(&self.store);
        let outcome = partition_iter::enumerate(&self.store, &partitions);
        let constrained_cells = self.store.constrained_unopened().len();
        let sunken_partitions = partitions.iter().filter(|p| p.is_sunken()).count();

        match aggregator::finalize(&mut self.store, &outcome) {
            Finalized::Unsatisfiable => Outcome::Unsatisfiable,
            Finalized::Probabilities => {
                let diag = Diagnostics {
                    total_weight: outcome.total_weight,
                    total_iterations: outcome.iterations,
                    legal_iterations: outcome.legal_iterations,
                    partitions: partitions.len(),
                    sunken_partitions,
                    constrained_cells,
                };
                log::debug!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    diag.total_weight,
                    diag.total_iterations,
                    diag.legal_iterations,
                    diag.partitions,
                    diag.sunken_partitions,
                    diag.constrained_cells,
                );
                self.last_diagnostics = diag;
                Outcome::Ok(diag)
            }
        }
    }

    /// Per-cell bad probability, in `[0.0, 1.0]`, row-major. Revealed and
    /// deduced cells report their certain value instead of the live
    /// marginal.
    pub fn probabilities(&self) -> Vec<f64> {
        let geo = self.store.geometry();
        (0..geo.cell_count())
            .map(|i| self.probability_of(HoleId(i as u16)))
            .collect()
    }

    pub fn probability_at(&self, x: u8, y: u8) -> Option<f64> {
        let geo = self.store.geometry();
        if !geo.in_bounds(x, y) {
            return None;
        }
        Some(self.probability_of(geo.hole_of(x, y)))
    }

    fn probability_of(&self, hole: HoleId) -> f64 {
        match self.store.revealed_at(hole) {
            Some(CellState::Bad(_)) => 1.0,
            Some(_) => 0.0,
            None => {
                if self.store.is_known_bad(hole) {
                    1.0
                } else if self.store.is_known_safe(hole) {
                    0.0
                } else {
                    self.store.probability(hole)
                }
            }
        }
    }

    pub fn is_dug(&self, x: u8, y: u8) -> bool {
        let geo = self.store.geometry();
        geo.in_bounds(x, y) && self.store.revealed_at(geo.hole_of(x, y)).is_some()
    }

    /// Test-only escape hatch into the constraint store, for invariant
    /// property tests that need to inspect `knownBad`/`knownSafe`/constraint
    /// internals directly rather than through the public marginal API.
    #[cfg(test)]
    pub(crate) fn store(&self) -> &ConstraintStore {
        &self.store
    }
}
