use crate::hole::HoleId;

/// Handle into the constraint slab. Stable for the lifetime of the
/// `Constraint` it names; never reused after retirement.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ConstraintId(pub u32);

/// Live representation of a revealed clue: its remaining bad-count and the
/// unopened neighbors still in scope.
///
/// Invariant: `0 <= remaining <= holes.len()`.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub at: HoleId,
    pub remaining: u8,
    pub holes: Vec<HoleId>,
}

impl Constraint {
    pub fn is_satisfied_by_safety(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_satisfied_by_badness(&self) -> bool {
        self.remaining as usize == self.holes.len()
    }
}

/// Append-only store of `Constraint`s with tombstones on retirement. Holes
/// and Constraints reference each other by handle instead of by pointer, so
/// this gives every `Constraint` a handle that remains valid (though
/// possibly tombstoned) for the life of the engine.
#[derive(Default)]
pub struct ConstraintSlab {
    slots: Vec<Option<Constraint>>,
}

impl ConstraintSlab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn insert(&mut self, constraint: Constraint) -> ConstraintId {
        let id = ConstraintId(self.slots.len() as u32);
        self.slots.push(Some(constraint));
        id
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.slots[id.0 as usize].as_ref()
    }

    pub fn get_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.slots[id.0 as usize].as_mut()
    }

    pub fn retire(&mut self, id: ConstraintId) {
        self.slots[id.0 as usize] = None;
    }

    pub fn is_live(&self, id: ConstraintId) -> bool {
        self.slots[id.0 as usize].is_some()
    }

    /// Iterates every constraint still in scope: not yet retired and with
    /// `remaining > 0`.
    pub fn active(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().and_then(|c| {
                (c.remaining > 0).then_some((ConstraintId(i as u32), c))
            })
        })
    }
}
