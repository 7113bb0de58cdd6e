//! Cat requests and the economy they feed: score, timer, satisfied count.

use crate::config::GameConfig;
use crate::tile::TileKind;
use rand::Rng;

/// A standing order: clear `remaining` more tiles of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Unique within a game, increasing in creation order.
    pub id: u64,
    pub kind: TileKind,
    pub quota: u32,
    pub remaining: u32,
}

impl Request {
    pub fn is_satisfied(&self) -> bool {
        self.remaining == 0
    }

    /// Cleared so far, for progress display.
    pub fn progress(&self) -> u32 {
        self.quota - self.remaining
    }
}

/// Score, timer and satisfied-request counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Economy {
    /// Keeps fractional points from chain multipliers.
    pub score: f64,
    /// Seconds left.
    pub timer: f64,
    pub satisfied: u32,
}

impl Economy {
    pub fn new(time_limit: f64) -> Self {
        Self {
            score: 0.0,
            timer: time_limit,
            satisfied: 0,
        }
    }

    /// Score as shown to the player (floored).
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    /// Timer as shown to the player (ceiling, never below zero).
    pub fn display_timer(&self) -> u64 {
        self.timer.max(0.0).ceil() as u64
    }
}

/// What one clear pass did to the economy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomyDelta {
    /// Points from the matched groups themselves.
    pub match_points: f64,
    /// Points from satisfied requests.
    pub bonus_points: f64,
    pub time_gained: f64,
    /// Requests that reached zero this pass (already removed from the queue).
    pub satisfied: Vec<Request>,
    /// Replacements appended to the queue.
    pub arrived: Vec<Request>,
}

impl EconomyDelta {
    pub fn total_points(&self) -> f64 {
        self.match_points + self.bonus_points
    }
}

/// Fixed-length queue of outstanding requests.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    requests: Vec<Request>,
    next_id: u64,
    quota_min: u32,
    quota_max: u32,
    time_per_tile: f64,
    bonus: f64,
}

impl RequestQueue {
    /// Queue with `config.queue_size` fresh requests, ids starting at 0.
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let mut queue = Self {
            requests: Vec::with_capacity(config.queue_size),
            next_id: 0,
            quota_min: config.quota_min,
            quota_max: config.quota_max,
            time_per_tile: config.time_per_tile,
            bonus: config.satisfaction_bonus,
        };
        for _ in 0..config.queue_size {
            let request = queue.generate(rng);
            queue.requests.push(request);
        }
        queue
    }

    /// New request: uniform kind, uniform quota in `[quota_min, quota_max]`.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Request {
        let kind = TileKind::random(rng);
        let quota = rng.gen_range(self.quota_min..=self.quota_max);
        let id = self.next_id;
        self.next_id += 1;
        Request {
            id,
            kind,
            quota,
            remaining: quota,
        }
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Feed one pass worth of cleared tiles into the queue.
    ///
    /// Every cleared tile counts toward every queued request of its kind, so two requests
    /// for the same kind progress together. Satisfied requests are dropped, each pays the
    /// bonus and is replaced by a fresh request at the back; the queue length does not
    /// change. Adds `time_per_tile` seconds per cleared tile.
    pub fn on_tiles_cleared<R: Rng + ?Sized>(
        &mut self,
        cleared: &[TileKind],
        economy: &mut Economy,
        rng: &mut R,
    ) -> EconomyDelta {
        let mut delta = EconomyDelta::default();
        if cleared.is_empty() {
            return delta;
        }

        delta.time_gained = cleared.len() as f64 * self.time_per_tile;
        economy.timer += delta.time_gained;

        for request in &mut self.requests {
            let hits = cleared.iter().filter(|k| **k == request.kind).count();
            let hits = u32::try_from(hits).unwrap_or(u32::MAX);
            request.remaining = request.remaining.saturating_sub(hits);
        }

        let (satisfied, pending): (Vec<Request>, Vec<Request>) = std::mem::take(&mut self.requests)
            .into_iter()
            .partition(Request::is_satisfied);
        self.requests = pending;

        for done in satisfied {
            economy.satisfied += 1;
            economy.score += self.bonus;
            delta.bonus_points += self.bonus;
            log::info!(
                "request #{} for {} {} satisfied (+{})",
                done.id,
                done.quota,
                done.kind,
                self.bonus
            );
            let replacement = self.generate(rng);
            log::debug!(
                "request #{} arrives: {} x{}",
                replacement.id,
                replacement.kind,
                replacement.quota
            );
            self.requests.push(replacement.clone());
            delta.arrived.push(replacement);
            delta.satisfied.push(done);
        }

        delta
    }

    #[cfg(test)]
    pub(crate) fn from_requests(config: &GameConfig, requests: Vec<Request>) -> Self {
        let next_id = requests.iter().map(|r| r.id + 1).max().unwrap_or(0);
        Self {
            requests,
            next_id,
            quota_min: config.quota_min,
            quota_max: config.quota_max,
            time_per_tile: config.time_per_tile,
            bonus: config.satisfaction_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn request(id: u64, kind: TileKind, remaining: u32) -> Request {
        Request {
            id,
            kind,
            quota: remaining.max(8),
            remaining,
        }
    }

    #[test]
    fn test_new_queue_has_configured_length_and_valid_quotas() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = GameConfig::default();
        let queue = RequestQueue::new(&config, &mut rng);
        assert_eq!(queue.len(), 3);
        let ids: Vec<u64> = queue.requests().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        for r in queue.requests() {
            assert!((8..=15).contains(&r.quota));
            assert_eq!(r.remaining, r.quota);
        }
    }

    #[test]
    fn test_empty_clear_is_a_no_op() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = GameConfig::default();
        let mut queue = RequestQueue::new(&config, &mut rng);
        let before = queue.requests().to_vec();
        let mut economy = Economy::new(60.0);
        let delta = queue.on_tiles_cleared(&[], &mut economy, &mut rng);
        assert_eq!(delta, EconomyDelta::default());
        assert_eq!(queue.requests(), &before[..]);
        assert_eq!(economy, Economy::new(60.0));
    }

    #[test]
    fn test_satisfying_a_request_pays_bonus_and_replaces_it() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let config = GameConfig::default();
        let mut queue = RequestQueue::from_requests(
            &config,
            vec![
                request(0, TileKind::Treat, 1),
                request(1, TileKind::Toy, 9),
                request(2, TileKind::Water, 12),
            ],
        );
        let mut economy = Economy::new(60.0);
        let cleared = [TileKind::Treat; 3];
        let delta = queue.on_tiles_cleared(&cleared, &mut economy, &mut rng);

        assert_eq!(economy.score, 500.0);
        assert_eq!(economy.satisfied, 1);
        assert_eq!(economy.timer, 61.5);
        assert_eq!(queue.len(), 3);
        assert_eq!(delta.satisfied.len(), 1);
        assert_eq!(delta.satisfied[0].id, 0);
        assert_eq!(delta.arrived.len(), 1);
        assert_eq!(delta.arrived[0].id, 3);
        // Unsatisfied keep their order, the replacement goes to the back.
        let ids: Vec<u64> = queue.requests().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_kind_requests_progress_together() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = GameConfig::default();
        let mut queue = RequestQueue::from_requests(
            &config,
            vec![
                request(0, TileKind::Brush, 10),
                request(1, TileKind::Brush, 4),
                request(2, TileKind::Toy, 8),
            ],
        );
        let mut economy = Economy::new(60.0);
        let cleared = [TileKind::Brush, TileKind::Brush, TileKind::Brush, TileKind::Toy];
        let delta = queue.on_tiles_cleared(&cleared, &mut economy, &mut rng);

        assert!(delta.satisfied.is_empty());
        let remaining: Vec<u32> = queue.requests().iter().map(|r| r.remaining).collect();
        assert_eq!(remaining, vec![7, 1, 7]);
        assert_eq!(economy.timer, 62.0);
    }

    #[test]
    fn test_remaining_is_floored_at_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = GameConfig::default();
        let mut queue = RequestQueue::from_requests(
            &config,
            vec![request(0, TileKind::Catnip, 2), request(1, TileKind::Catnip, 2)],
        );
        let mut economy = Economy::new(10.0);
        let delta = queue.on_tiles_cleared(&[TileKind::Catnip; 5], &mut economy, &mut rng);
        assert_eq!(delta.satisfied.len(), 2);
        assert!(delta.satisfied.iter().all(|r| r.remaining == 0));
        assert_eq!(economy.satisfied, 2);
        assert_eq!(economy.score, 1000.0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_display_rounding() {
        let economy = Economy {
            score: 112.5,
            timer: 3.2,
            satisfied: 0,
        };
        assert_eq!(economy.display_score(), 112);
        assert_eq!(economy.display_timer(), 4);
        let expired = Economy {
            timer: -0.4,
            ..economy
        };
        assert_eq!(expired.display_timer(), 0);
    }
}
