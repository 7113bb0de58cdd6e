//! Nekomatch rules engine: a match-three board, chain resolution, and the cat request
//! economy it feeds.
//!
//! The crate is pure game logic. Randomness comes in through `rand::Rng`, time through
//! [`GameSession::tick`], and every move returns the intermediate boards so a front end
//! can animate at its own pace without affecting the outcome.
//!
//! ```
//! use nekomatch::{GameConfig, GameSession, Pos};
//!
//! let mut game = GameSession::start_new_game(GameConfig::default(), Some(7)).unwrap();
//! match game.attempt_swap(Pos::new(0, 0), Pos::new(0, 1)) {
//!     Ok(outcome) => assert!(nekomatch::matcher::is_stable(outcome.final_grid())),
//!     Err(e) => panic!("{e}"),
//! }
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod matcher;
pub mod requests;
pub mod resolver;
pub mod scoring;
pub mod session;
pub mod tile;

pub use config::GameConfig;
pub use error::{ConfigError, GameError};
pub use grid::{Grid, Pos};
pub use matcher::{MatchGroup, find_matches};
pub use requests::{Economy, EconomyDelta, Request, RequestQueue};
pub use resolver::{ChainResolver, ChainStep, ResolverState, SwapOutcome};
pub use session::{GameSession, Snapshot, TickOutcome};
pub use tile::TileKind;
