use std::collections::{HashMap, HashSet};

use bitvec::prelude as bv;

use crate::cell::CellState;
use crate::constraint::{Constraint, ConstraintId, ConstraintSlab};
use crate::hole::{Geometry, HoleId};
use crate::neighbor_iter::NeighborIterable;

/// Deductive constraint store: tracks per-cell clue adjacency, the
/// constrained/unconstrained unopened sets, and the known-safe/known-bad
/// sets, and propagates forced-safe/forced-bad deductions as reveals come in.
///
/// Holes are identified by stable `HoleId` and Constraints by `ConstraintId`
/// handle, which is what lets this struct own everything by value instead of
/// juggling raw pointers.
pub struct ConstraintStore {
    geo: Geometry,
    total_bads: u16,

    /// What the caller has told us via `set_cell`, authoritative for both
    /// idempotence checks and reset-and-replay.
    revealed: Vec<Option<CellState>>,

    constraints: ConstraintSlab,
    /// The constraint a clue cell owns, keyed by that cell's `HoleId`.
    constraint_of: Vec<Option<ConstraintId>>,
    /// For each hole, the constraints that mention it -- its imposing set.
    imposing: Vec<HashSet<ConstraintId>>,

    known_bad: bv::BitVec,
    known_safe: bv::BitVec,
    constrained_unopened: HashSet<HoleId>,
    unconstrained_unopened: HashSet<HoleId>,

    /// Scratch/result marginal, valid for unopened holes only; refreshed by
    /// `recompute()`. Revealed and known cells are reported via their own
    /// status instead (see `Engine::probabilities`).
    probabilities: Vec<f64>,

    /// Set when propagation would violate a `Constraint` invariant (e.g. a
    /// `remaining` decrement below 0) or the bad budget is exceeded.
    conflict: bool,
}

impl NeighborIterable for ConstraintStore {
    fn geometry(&self) -> Geometry {
        self.geo
    }
}

impl ConstraintStore {
    pub fn new(geo: Geometry, total_bads: u16) -> Self {
        let n = geo.cell_count();
        let mut unconstrained_unopened = HashSet::with_capacity(n);
        for i in 0..n {
            unconstrained_unopened.insert(HoleId(i as u16));
        }
        Self {
            geo,
            total_bads,
            revealed: vec![None; n],
            constraints: ConstraintSlab::new(),
            constraint_of: vec![None; n],
            imposing: vec![HashSet::new(); n],
            known_bad: bv::bitvec![0; n],
            known_safe: bv::bitvec![0; n],
            constrained_unopened: HashSet::new(),
            unconstrained_unopened,
            probabilities: vec![0.0; n],
            conflict: false,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geo
    }

    pub fn total_bads(&self) -> u16 {
        self.total_bads
    }

    pub fn take_conflict(&mut self) -> bool {
        std::mem::replace(&mut self.conflict, false)
    }

    pub fn revealed_at(&self, hole: HoleId) -> Option<CellState> {
        self.revealed[hole.0 as usize]
    }

    pub fn is_known_bad(&self, hole: HoleId) -> bool {
        self.known_bad[hole.0 as usize]
    }

    pub fn is_known_safe(&self, hole: HoleId) -> bool {
        self.known_safe[hole.0 as usize]
    }

    pub fn known_bad_count(&self) -> usize {
        self.known_bad.count_ones()
    }

    pub fn constrained_unopened(&self) -> &HashSet<HoleId> {
        &self.constrained_unopened
    }

    pub fn unconstrained_unopened(&self) -> &HashSet<HoleId> {
        &self.unconstrained_unopened
    }

    pub fn imposing_set(&self, hole: HoleId) -> &HashSet<ConstraintId> {
        &self.imposing[hole.0 as usize]
    }

    pub fn constraints(&self) -> &ConstraintSlab {
        &self.constraints
    }

    pub fn probability(&self, hole: HoleId) -> f64 {
        self.probabilities[hole.0 as usize]
    }

    pub fn probabilities_mut(&mut self) -> &mut [f64] {
        &mut self.probabilities
    }

    fn neighbor_holes(&self, hole: HoleId) -> arrayvec::ArrayVec<HoleId, 8> {
        let (x, y) = self.geo.coords_of(hole);
        self.neighbor_holes_of(x, y)
    }

    /// Records a reveal. Assumes `(x, y)` is in bounds -- the façade rejects
    /// out-of-bounds coordinates before ever calling this.
    pub fn set_cell(&mut self, x: u8, y: u8, state: CellState) {
        let hole = self.geo.hole_of(x, y);
        match self.revealed[hole.0 as usize] {
            Some(prev) if prev == state => {} // idempotent, nothing to do
            Some(_) => {
                self.revealed[hole.0 as usize] = None;
                self.reset_and_replay();
                self.apply(hole, state);
                self.revealed[hole.0 as usize] = Some(state);
            }
            None => {
                self.apply(hole, state);
                self.revealed[hole.0 as usize] = Some(state);
            }
        }
    }

    fn apply(&mut self, hole: HoleId, state: CellState) {
        match state {
            CellState::Undug => {}
            CellState::Bad(_) => self.mark_bad(hole),
            // A reward tier carries no constraint information: handled
            // identically to revealing a zero-information safe cell, which
            // is exactly `mark_safe` -- it must drop the hole from every
            // referencing `Constraint` and cascade a forced-bad retirement
            // the same way any other safe reveal does.
            CellState::Reward(_) => self.mark_safe(hole),
            CellState::Clue(n) => self.apply_clue(hole, n),
        }
    }

    fn apply_clue(&mut self, hole: HoleId, n: u8) {
        let mut remaining = n;
        let mut constrained_candidates = Vec::new();
        let mut touched_undug = Vec::new();

        for nb in self.neighbor_holes(hole) {
            let nb_idx = nb.0 as usize;
            if self.known_bad[nb_idx] {
                match remaining.checked_sub(1) {
                    Some(r) => remaining = r,
                    None => self.conflict = true,
                }
            } else if self.revealed[nb_idx].is_none() {
                touched_undug.push(nb);
                if !self.known_safe[nb_idx] {
                    constrained_candidates.push(nb);
                }
            }
        }

        let cid = self.constraints.insert(Constraint {
            at: hole,
            remaining,
            holes: constrained_candidates.clone(),
        });
        for nb in &touched_undug {
            self.imposing[nb.0 as usize].insert(cid);
            self.unconstrained_unopened.remove(nb);
        }
        for nb in &constrained_candidates {
            self.constrained_unopened.insert(*nb);
        }
        self.constraint_of[hole.0 as usize] = Some(cid);
        self.constrained_unopened.remove(&hole);

        // The clue cell is itself safe; this cascades into any constraint
        // that already mentioned it (it may have been a constrained
        // unopened hole of an earlier clue).
        self.mark_safe(hole);

        if self.constraints.is_live(cid) {
            let (remaining_now, holes_snapshot) = {
                let c = self.constraints.get(cid).unwrap();
                (c.remaining, c.holes.clone())
            };
            if remaining_now == 0 {
                for hh in holes_snapshot {
                    self.mark_safe(hh);
                }
                self.constraints.retire(cid);
            } else if remaining_now as usize == holes_snapshot.len() {
                for hh in holes_snapshot {
                    self.mark_bad(hh);
                }
                self.constraints.retire(cid);
            }
        }
    }

    pub fn mark_bad(&mut self, hole: HoleId) {
        let idx = hole.0 as usize;
        if self.known_bad[idx] {
            return; // already known, nothing to cascade again
        }
        self.known_bad.set(idx, true);
        self.probabilities[idx] = 1.0;
        self.constrained_unopened.remove(&hole);
        self.unconstrained_unopened.remove(&hole);
        if self.known_bad.count_ones() > self.total_bads as usize {
            self.conflict = true;
        }

        let affected: Vec<ConstraintId> = self.imposing[idx].iter().copied().collect();
        for cid in affected {
            if !self.constraints.is_live(cid) {
                continue;
            }
            let hit_zero = {
                let c = self.constraints.get_mut(cid).unwrap();
                if let Some(pos) = c.holes.iter().position(|&h| h == hole) {
                    c.holes.remove(pos);
                    match c.remaining.checked_sub(1) {
                        Some(r) => {
                            c.remaining = r;
                            r == 0
                        }
                        None => {
                            self.conflict = true;
                            false
                        }
                    }
                } else {
                    false
                }
            };
            if hit_zero {
                let holes_snapshot = self.constraints.get(cid).unwrap().holes.clone();
                for hh in holes_snapshot {
                    self.mark_safe(hh);
                }
                self.constraints.retire(cid);
            }
        }
    }

    pub fn mark_safe(&mut self, hole: HoleId) {
        let idx = hole.0 as usize;
        if self.known_safe[idx] {
            return;
        }
        self.known_safe.set(idx, true);
        self.constrained_unopened.remove(&hole);
        self.unconstrained_unopened.remove(&hole);
        self.probabilities[idx] = 0.0;

        let affected: Vec<ConstraintId> = self.imposing[idx].iter().copied().collect();
        for cid in affected {
            if !self.constraints.is_live(cid) {
                continue;
            }
            let forces_bad = {
                let c = self.constraints.get_mut(cid).unwrap();
                if let Some(pos) = c.holes.iter().position(|&h| h == hole) {
                    c.holes.remove(pos);
                    c.remaining as usize == c.holes.len()
                } else {
                    false
                }
            };
            if forces_bad {
                let holes_snapshot = self.constraints.get(cid).unwrap().holes.clone();
                for hh in holes_snapshot {
                    self.mark_bad(hh);
                }
                self.constraints.retire(cid);
            }
        }
    }

    /// Clears every derived data structure and replays every previously
    /// accepted reveal (preserved in `revealed`) from scratch.
    ///
    /// Replayed in two passes -- every `Bad` reveal first, then every other
    /// reveal in row-major order -- rather than a single row-major pass.
    /// `apply_clue` classifies a neighbor as bad via the live `known_bad`
    /// bitvec, which is only accurate once that neighbor's own reveal has
    /// itself been replayed; a single row-major pass can process a clue
    /// before a same-row-major-later bad neighbor it depends on, silently
    /// dropping that neighbor from both `remaining` and `holes`. Ground
    /// truth for "is this hole bad" never depends on replay order -- it is
    /// exactly the set of `Bad` reveals in `revealed`, which is never
    /// cleared by reset -- so applying all of them before any `Clue` or
    /// `Reward` reveal makes every clue's neighbor classification order
    /// independent again.
    fn reset_and_replay(&mut self) {
        let n = self.geo.cell_count();
        self.constraints.clear();
        self.constraint_of = vec![None; n];
        self.imposing = vec![HashSet::new(); n];
        self.known_bad = bv::bitvec![0; n];
        self.known_safe = bv::bitvec![0; n];
        self.constrained_unopened.clear();
        self.unconstrained_unopened.clear();
        for i in 0..n {
            self.unconstrained_unopened.insert(HoleId(i as u16));
        }
        self.probabilities = vec![0.0; n];
        self.conflict = false;

        for i in 0..n {
            if let Some(state @ CellState::Bad(_)) = self.revealed[i] {
                self.apply(HoleId(i as u16), state);
            }
        }
        for i in 0..n {
            match self.revealed[i] {
                Some(CellState::Bad(_)) => {} // already applied above
                Some(state) => self.apply(HoleId(i as u16), state),
                None => {}
            }
        }
    }

    /// Reverts the most recent (already recorded) reveal and replays
    /// everything else -- used by the façade to recover from an
    /// inconsistent or unsatisfiable reveal.
    pub fn revert_and_replay(&mut self, hole: HoleId) {
        self.revealed[hole.0 as usize] = None;
        self.reset_and_replay();
    }
}

/// Equality of imposing sets, used by the partitioner: two holes belong to
/// the same partition iff their imposing sets are equal. Implemented by
/// hashing the sorted list of constraint handles so partition rebuild is
/// O(P) rather than O(P^2).
pub fn imposing_set_key(set: &HashSet<ConstraintId>) -> Vec<ConstraintId> {
    let mut v: Vec<ConstraintId> = set.iter().copied().collect();
    v.sort_unstable();
    v
}

pub type ImposingKey = Vec<ConstraintId>;
pub type ImposingIndex = HashMap<ImposingKey, usize>;
