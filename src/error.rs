use thiserror::Error;

/// Errors surfaced by `Engine`.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("coordinates ({x}, {y}) are out of bounds")]
    OutOfBounds { x: u8, y: u8 },

    /// No legal bad-count assignment exists under the current constraints,
    /// whether because a reveal directly over-budgeted the bad count or
    /// because the resulting constraints admit no configuration at all. The
    /// engine has already reset to the state before the offending reveal and
    /// replayed every earlier one.
    #[error("constraints admit no legal configuration; board reset")]
    Unsatisfiable,

    /// `total_bads` is larger than the board holds. Rejected at
    /// construction time, before any state is created.
    #[error("bad-cell budget exceeds board size")]
    BadBudgetExceeded,
}
