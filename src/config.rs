//! Game parameters. Defaults are the values of the reference café game.

use crate::error::ConfigError;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 8;
/// Starting time in seconds.
pub const INITIAL_TIME: f64 = 60.0;
/// Seconds added to the timer per cleared tile.
pub const TIME_RECOVERY_PER_TILE: f64 = 0.5;
/// Score bonus for each satisfied request.
pub const SATISFACTION_BONUS: f64 = 500.0;
pub const REQUEST_QUOTA_MIN: u32 = 8;
pub const REQUEST_QUOTA_MAX: u32 = 15;
/// Number of requests waiting at any time.
pub const QUEUE_SIZE: usize = 3;

/// Options that affect game rules (board size, timer, request economy).
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub board_size: usize,
    pub time_limit: f64,
    pub time_per_tile: f64,
    pub satisfaction_bonus: f64,
    pub quota_min: u32,
    pub quota_max: u32,
    pub queue_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            time_limit: INITIAL_TIME,
            time_per_tile: TIME_RECOVERY_PER_TILE,
            satisfaction_bonus: SATISFACTION_BONUS,
            quota_min: REQUEST_QUOTA_MIN,
            quota_max: REQUEST_QUOTA_MAX,
            queue_size: QUEUE_SIZE,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size < 3 {
            return Err(ConfigError::BoardTooSmall(self.board_size));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.quota_min == 0 || self.quota_min > self.quota_max {
            return Err(ConfigError::QuotaRange {
                min: self.quota_min,
                max: self.quota_max,
            });
        }
        if !self.time_limit.is_finite() || self.time_limit <= 0.0 {
            return Err(ConfigError::TimeLimit(self.time_limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_degenerate_values() {
        let small = GameConfig { board_size: 2, ..GameConfig::default() };
        assert_eq!(small.validate(), Err(ConfigError::BoardTooSmall(2)));

        let no_queue = GameConfig { queue_size: 0, ..GameConfig::default() };
        assert_eq!(no_queue.validate(), Err(ConfigError::EmptyQueue));

        let inverted = GameConfig { quota_min: 9, quota_max: 4, ..GameConfig::default() };
        assert!(matches!(inverted.validate(), Err(ConfigError::QuotaRange { .. })));

        let no_time = GameConfig { time_limit: 0.0, ..GameConfig::default() };
        assert!(matches!(no_time.validate(), Err(ConfigError::TimeLimit(_))));
    }
}
