//! Chain resolver: swap, then clear/compact/refill passes until the board is stable.

use crate::error::GameError;
use crate::grid::{Grid, Pos};
use crate::matcher::{MatchGroup, find_matches};
use crate::requests::{Economy, EconomyDelta, Request, RequestQueue};
use crate::scoring;
use rand::Rng;

/// Where the resolver is in a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    Swapping,
    /// Clearing the groups of the given chain depth (1 = direct result of the swap).
    Resolving(u32),
    Reverting,
}

/// One clear pass of a cascade, with the board after each phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStep {
    pub chain_depth: u32,
    pub groups: Vec<MatchGroup>,
    /// Matched cells emptied.
    pub cleared: Grid,
    /// After gravity.
    pub compacted: Grid,
    /// After refill; the next pass (if any) starts from here.
    pub refilled: Grid,
    pub delta: EconomyDelta,
    /// Score, timer and satisfied count once this pass is paid out.
    pub economy: Economy,
    /// Request queue once this pass is paid out.
    pub requests: Vec<Request>,
}

/// Result of a swap attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// The swap made no match and was undone.
    Reverted { swapped: Grid, restored: Grid },
    /// The swap matched; `steps` holds every pass of the cascade in order.
    Resolved { swapped: Grid, steps: Vec<ChainStep> },
}

impl SwapOutcome {
    pub fn is_reverted(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }

    /// Board at the end of the move.
    pub fn final_grid(&self) -> &Grid {
        match self {
            Self::Reverted { restored, .. } => restored,
            Self::Resolved { swapped, steps } => steps.last().map_or(swapped, |s| &s.refilled),
        }
    }

    pub fn steps(&self) -> &[ChainStep] {
        match self {
            Self::Reverted { .. } => &[],
            Self::Resolved { steps, .. } => steps,
        }
    }

    /// Deepest chain reached (0 for a reverted swap).
    pub fn max_chain(&self) -> u32 {
        self.steps().last().map_or(0, |s| s.chain_depth)
    }

    pub fn total_points(&self) -> f64 {
        self.steps().iter().map(|s| s.delta.total_points()).sum()
    }
}

/// Iterator over the passes of a cascade. Each `next` performs exactly one
/// score → request update → clear → compact → refill → detect pass.
pub struct Cascade<'a, R: Rng + ?Sized> {
    grid: &'a mut Grid,
    queue: &'a mut RequestQueue,
    economy: &'a mut Economy,
    rng: &'a mut R,
    pending: Vec<MatchGroup>,
    depth: u32,
}

impl<'a, R: Rng + ?Sized> Cascade<'a, R> {
    pub fn new(
        grid: &'a mut Grid,
        queue: &'a mut RequestQueue,
        economy: &'a mut Economy,
        rng: &'a mut R,
        groups: Vec<MatchGroup>,
    ) -> Self {
        Self {
            grid,
            queue,
            economy,
            rng,
            pending: groups,
            depth: 1,
        }
    }

    /// Chain depth of the next pass.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// No matches left on the board.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<R: Rng + ?Sized> Iterator for Cascade<'_, R> {
    type Item = ChainStep;

    fn next(&mut self) -> Option<ChainStep> {
        if self.pending.is_empty() {
            return None;
        }
        let groups = std::mem::take(&mut self.pending);
        let depth = self.depth;

        let match_points: f64 = groups
            .iter()
            .map(|g| scoring::score(g.len(), depth))
            .sum();
        self.economy.score += match_points;

        let mut kinds = Vec::new();
        for group in &groups {
            kinds.extend(self.grid.clear(&group.cells));
        }
        let mut delta = self.queue.on_tiles_cleared(&kinds, self.economy, self.rng);
        delta.match_points = match_points;
        let cleared = self.grid.clone();

        self.grid.compact();
        let compacted = self.grid.clone();

        self.grid.refill(self.rng);
        let refilled = self.grid.clone();

        log::debug!(
            "chain {}: {} group(s), {} tile(s), +{:.1} points",
            depth,
            groups.len(),
            kinds.len(),
            delta.total_points()
        );

        self.pending = find_matches(self.grid);
        if !self.pending.is_empty() {
            self.depth += 1;
        }

        Some(ChainStep {
            chain_depth: depth,
            groups,
            cleared,
            compacted,
            refilled,
            delta,
            economy: self.economy.clone(),
            requests: self.queue.requests().to_vec(),
        })
    }
}

/// Runs moves through the Idle → Swapping → Resolving(n)/Reverting → Idle cycle.
///
/// Not reentrant: callers hold it by `&mut`, and a move always runs to completion before
/// `resolve` returns.
#[derive(Debug, Default)]
pub struct ChainResolver {
    state: ResolverState,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    fn enter(&mut self, next: ResolverState) {
        log::trace!("resolver {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Swap `a` and `b` and resolve the consequences.
    ///
    /// Bounds are checked before anything changes; adjacency is the caller's contract.
    /// The resolver is back in `Idle` whenever this returns, error or not.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        queue: &mut RequestQueue,
        economy: &mut Economy,
        rng: &mut R,
        a: Pos,
        b: Pos,
    ) -> Result<SwapOutcome, GameError> {
        // Rejected swaps leave the board untouched and the resolver Idle.
        grid.swap(a, b)?;
        self.enter(ResolverState::Swapping);
        let swapped = grid.clone();
        let groups = find_matches(grid);

        if groups.is_empty() {
            self.enter(ResolverState::Reverting);
            let restored = grid.swap(a, b);
            self.enter(ResolverState::Idle);
            restored?;
            log::debug!("swap {} <-> {} made no match; reverted", a, b);
            return Ok(SwapOutcome::Reverted {
                swapped,
                restored: grid.clone(),
            });
        }

        let mut steps = Vec::new();
        let mut cascade = Cascade::new(grid, queue, economy, rng, groups);
        while !cascade.is_settled() {
            self.enter(ResolverState::Resolving(cascade.depth()));
            if let Some(step) = cascade.next() {
                steps.push(step);
            }
        }
        self.enter(ResolverState::Idle);

        log::info!(
            "swap {} <-> {} resolved in {} pass(es)",
            a,
            b,
            steps.len()
        );
        Ok(SwapOutcome::Resolved { swapped, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::matcher::is_stable;
    use crate::requests::Request;
    use crate::tile::TileKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        grid: Grid,
        queue: RequestQueue,
        economy: Economy,
        rng: ChaCha8Rng,
        resolver: ChainResolver,
    }

    impl Fixture {
        fn new(board: &str) -> Self {
            let config = GameConfig::default();
            let requests = vec![Request {
                id: 0,
                kind: TileKind::Cushion,
                quota: 15,
                remaining: 15,
            }];
            Self {
                grid: board.parse().unwrap(),
                queue: RequestQueue::from_requests(&config, requests),
                economy: Economy::new(60.0),
                rng: ChaCha8Rng::seed_from_u64(42),
                resolver: ChainResolver::new(),
            }
        }

        fn swap(&mut self, a: Pos, b: Pos) -> Result<SwapOutcome, GameError> {
            self.resolver.resolve(
                &mut self.grid,
                &mut self.queue,
                &mut self.economy,
                &mut self.rng,
                a,
                b,
            )
        }
    }

    #[test]
    fn test_no_match_reverts_byte_for_byte() {
        let board = "TYBC\nYBCT\nBCTY\nCTYB";
        let mut fx = Fixture::new(board);
        let before = fx.grid.clone();
        let outcome = fx.swap(Pos::new(0, 0), Pos::new(0, 1)).unwrap();
        assert!(outcome.is_reverted());
        assert_eq!(fx.grid, before);
        assert_eq!(outcome.final_grid(), &before);
        assert_eq!(fx.economy, Economy::new(60.0));
        assert_eq!(fx.resolver.state(), ResolverState::Idle);
        if let SwapOutcome::Reverted { swapped, .. } = outcome {
            assert_eq!(swapped.to_string().lines().next(), Some("YTBC"));
        }
    }

    #[test]
    fn test_out_of_range_swap_is_rejected_without_change() {
        let mut fx = Fixture::new("TYBC\nYBCT\nBCTY\nCTYB");
        let before = fx.grid.clone();
        let err = fx.swap(Pos::new(3, 3), Pos::new(3, 4)).unwrap_err();
        assert!(matches!(err, GameError::InvalidCoordinate { .. }));
        assert_eq!(fx.grid, before);
        assert_eq!(fx.resolver.state(), ResolverState::Idle);

        // The first coordinate out of range as well, then a good swap still resolves.
        let err = fx.swap(Pos::new(4, 0), Pos::new(3, 0)).unwrap_err();
        assert!(matches!(err, GameError::InvalidCoordinate { row: 4, .. }));
        assert_eq!(fx.grid, before);
        assert_eq!(fx.resolver.state(), ResolverState::Idle);
        assert!(fx.swap(Pos::new(0, 0), Pos::new(0, 1)).unwrap().is_reverted());
        assert_eq!(fx.resolver.state(), ResolverState::Idle);
    }

    #[test]
    fn test_matching_swap_scores_and_ends_stable() {
        // Swapping (1,2) up into row 0 completes TTT.
        let board = "TTYBC\nBCTWN\nCWNBY\nWNBYC\nNBYCW";
        let mut fx = Fixture::new(board);
        let outcome = fx.swap(Pos::new(0, 2), Pos::new(1, 2)).unwrap();
        let steps = outcome.steps();
        assert!(!steps.is_empty());
        assert_eq!(steps[0].chain_depth, 1);
        assert_eq!(steps[0].groups.len(), 1);
        assert_eq!(steps[0].groups[0].kind, TileKind::Treat);
        assert_eq!(steps[0].delta.match_points, 30.0);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.chain_depth, i as u32 + 1);
            assert!(step.refilled.is_full());
        }
        assert!(is_stable(&fx.grid));
        assert_eq!(outcome.final_grid(), &fx.grid);
        assert!(fx.economy.timer >= 61.5);
        assert!((fx.economy.score - outcome.total_points()).abs() < 1e-9);
        assert_eq!(fx.resolver.state(), ResolverState::Idle);

        // Each pass records the economy as it stood right after that pass.
        assert_eq!(steps[0].economy.score, steps[0].delta.total_points());
        assert_eq!(steps[0].economy.timer, 60.0 + steps[0].delta.time_gained);
        let last = &steps[steps.len() - 1];
        assert_eq!(last.economy, fx.economy);
        assert_eq!(last.requests.as_slice(), fx.queue.requests());
    }

    #[test]
    fn test_second_pass_uses_chain_multiplier() {
        // Clearing TTT on the bottom row drops "Y N N" onto the N at (4, 3).
        let board = "CWBYN\nBYCWY\nWCYBC\nYNNBW\nTTNTC";
        let mut fx = Fixture::new(board);
        let outcome = fx.swap(Pos::new(4, 2), Pos::new(4, 3)).unwrap();
        let steps = outcome.steps();
        assert!(steps.len() >= 2, "expected a cascade");

        assert_eq!(steps[0].chain_depth, 1);
        assert_eq!(steps[0].delta.match_points, 30.0);
        assert_eq!(steps[0].compacted.to_string().lines().last(), Some("YNNNC"));

        assert_eq!(steps[1].chain_depth, 2);
        assert!(steps[1].groups.iter().any(|g| g.kind == TileKind::Catnip
            && g.cells.contains(&Pos::new(4, 1))
            && g.cells.contains(&Pos::new(4, 3))));
        let base: f64 = steps[1]
            .groups
            .iter()
            .map(|g| scoring::base_points(g.len()))
            .sum();
        assert_eq!(steps[1].delta.match_points, base * 1.5);
        assert_eq!(outcome.max_chain(), steps.len() as u32);
        assert!(is_stable(&fx.grid));
    }
}
