//! `caveprobe` computes, after every reveal on a minesweeper-like board, the
//! marginal probability that each remaining unopened cell is bad.
//!
//! The public surface is [`Engine`]: construct one with the board's
//! dimensions and bad-cell budget, feed it reveals through
//! [`Engine::reveal`], and read back per-cell marginals through
//! [`Engine::probabilities`]. [`Board`] is a ground-truth random board
//! generator used by the self-play benchmark and the interactive binary;
//! it is not part of the deduction engine itself.

mod aggregator;
mod cell;
mod config_iter;
mod constraint;
mod engine;
mod error;
mod hole;
mod neighbor_iter;
mod partition;
mod partition_iter;
#[cfg(test)]
mod proptests;
mod store;

pub mod board;

pub use board::Board;
pub use cell::{BadKind, CellState, RewardTier};
pub use engine::{Diagnostics, Engine};
pub use error::EngineError;
pub use hole::{Geometry, HoleId};
