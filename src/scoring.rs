//! Points for a cleared group: base by group size, scaled by chain depth.

pub const SCORE_3_MATCH: f64 = 30.0;
pub const SCORE_4_MATCH: f64 = 50.0;
pub const SCORE_5_MATCH: f64 = 80.0;
/// Each further link of a chain multiplies the base by this.
pub const CHAIN_MULTIPLIER: f64 = 1.5;

/// Base points by group size. Groups of five or more all score the same; anything under
/// three is not a match and scores nothing.
pub fn base_points(group_size: usize) -> f64 {
    match group_size {
        0..=2 => 0.0,
        3 => SCORE_3_MATCH,
        4 => SCORE_4_MATCH,
        _ => SCORE_5_MATCH,
    }
}

/// `1.5^(depth - 1)`; depth 0 is treated as 1.
pub fn chain_multiplier(chain_depth: u32) -> f64 {
    let exp = chain_depth.saturating_sub(1).min(i32::MAX as u32) as i32;
    CHAIN_MULTIPLIER.powi(exp)
}

/// Points awarded for one group. Fractions are kept; display floors the total.
pub fn score(group_size: usize, chain_depth: u32) -> f64 {
    base_points(group_size) * chain_multiplier(chain_depth)
}
