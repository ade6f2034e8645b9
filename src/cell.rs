/// The kind of bad item occupying a cell, each consuming one slot of the
/// shared `total_bads` budget.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BadKind {
    Bomb,
    Rupoor,
}

/// A reward tier revealed on a safe dig. Reward tiers carry no constraint
/// information: revealing one is equivalent to marking the cell known-safe,
/// with no clue contributed to any `Constraint`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RewardTier {
    Green,
    Blue,
    Red,
    Silver,
    Gold,
}

/// Public reveal alphabet accepted by `Engine::reveal`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CellState {
    Undug,
    /// Count of bad neighbors, `n in [0, 8]`.
    Clue(u8),
    Bad(BadKind),
    Reward(RewardTier),
}

impl CellState {
    pub fn is_bad(self) -> bool {
        matches!(self, CellState::Bad(_))
    }
}
