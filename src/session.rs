//! Game session: every piece of mutable game state behind one owner.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::grid::{Grid, Pos};
use crate::requests::{Economy, Request, RequestQueue};
use crate::resolver::{ChainResolver, ResolverState, SwapOutcome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Copy of everything a renderer needs to draw the game.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub requests: Vec<Request>,
    pub economy: Economy,
}

/// Timer state after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Seconds left; may be slightly negative on the tick that ends the game.
    pub timer: f64,
    /// The game is over. Stays true on every later tick.
    pub expired: bool,
}

/// One game: board, request queue, economy and the random source that drives them.
///
/// `R` is injectable for tests; the default is a seeded ChaCha stream so that a seed
/// plus a list of swaps replays exactly.
#[derive(Debug)]
pub struct GameSession<R: Rng = ChaCha8Rng> {
    config: GameConfig,
    grid: Grid,
    queue: RequestQueue,
    economy: Economy,
    rng: R,
    resolver: ChainResolver,
    seed: Option<u64>,
    moves: u32,
    expired: bool,
}

impl GameSession<ChaCha8Rng> {
    /// New game. Without a seed one is drawn from the OS so the game can still be replayed
    /// from `seed()`.
    pub fn start_new_game(config: GameConfig, seed: Option<u64>) -> Result<Self, GameError> {
        let seed = seed.unwrap_or_else(rand::random);
        let mut session = Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))?;
        session.seed = Some(seed);
        log::info!("new game, seed {}", seed);
        Ok(session)
    }
}

impl<R: Rng> GameSession<R> {
    /// New game drawing from `rng`: a stable board first, then the request queue.
    pub fn with_rng(config: GameConfig, mut rng: R) -> Result<Self, GameError> {
        config.validate()?;
        let grid = Grid::initialize(config.board_size, &mut rng)?;
        let queue = RequestQueue::new(&config, &mut rng);
        let economy = Economy::new(config.time_limit);
        log::trace!("initial board:\n{}", grid);
        Ok(Self {
            config,
            grid,
            queue,
            economy,
            rng,
            resolver: ChainResolver::new(),
            seed: None,
            moves: 0,
            expired: false,
        })
    }

    /// Swap two adjacent tiles and resolve the whole cascade.
    ///
    /// Out-of-range or non-adjacent coordinates, and any move after time is up, are
    /// rejected without touching the state. A swap that makes no match comes back as
    /// `SwapOutcome::Reverted` with the board unchanged.
    pub fn attempt_swap(&mut self, a: Pos, b: Pos) -> Result<SwapOutcome, GameError> {
        if self.expired {
            return Err(GameError::TimeExpired);
        }
        self.grid.check(a)?;
        self.grid.check(b)?;
        if !a.is_adjacent(b) {
            return Err(GameError::NotAdjacent { a, b });
        }
        let outcome = self.resolver.resolve(
            &mut self.grid,
            &mut self.queue,
            &mut self.economy,
            &mut self.rng,
            a,
            b,
        )?;
        if !outcome.is_reverted() {
            self.moves += 1;
        }
        Ok(outcome)
    }

    /// Count the timer down by `elapsed`. Once it reaches zero the game is over and the
    /// timer stops moving.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        if !self.expired {
            self.economy.timer -= elapsed.as_secs_f64();
            if self.economy.timer <= 0.0 {
                self.expired = true;
                log::info!(
                    "time up: score {}, {} cat(s) satisfied",
                    self.economy.display_score(),
                    self.economy.satisfied
                );
            }
        }
        TickOutcome {
            timer: self.economy.timer,
            expired: self.expired,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            requests: self.queue.requests().to_vec(),
            economy: self.economy.clone(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn requests(&self) -> &[Request] {
        self.queue.requests()
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the session was started from, if it owns a seeded stream.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Swaps that produced a match.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_over(&self) -> bool {
        self.expired
    }

    pub fn resolver_state(&self) -> ResolverState {
        self.resolver.state()
    }
}
