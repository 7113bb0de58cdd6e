//! Error types for the rules engine.

use crate::grid::Pos;
use thiserror::Error;

/// Rejected operation. Returned before any state is touched, so a failed call never leaves
/// the board or the economy half-updated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("coordinate ({row}, {col}) is outside the {size}x{size} board")]
    InvalidCoordinate { row: usize, col: usize, size: usize },
    #[error("tiles {a} and {b} are not orthogonally adjacent")]
    NotAdjacent { a: Pos, b: Pos },
    #[error("time is up; no more moves are accepted")]
    TimeExpired,
    #[error("board did not settle after {passes} regeneration passes")]
    Unstable { passes: usize },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot parse board: {0}")]
    ParseGrid(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board size must be at least 3 (got {0})")]
    BoardTooSmall(usize),
    #[error("request queue needs at least one slot")]
    EmptyQueue,
    #[error("request quota range {min}..={max} is empty or starts at zero")]
    QuotaRange { min: u32, max: u32 },
    #[error("time limit must be a positive number of seconds (got {0})")]
    TimeLimit(f64),
}
