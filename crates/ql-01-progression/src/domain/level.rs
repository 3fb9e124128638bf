//! Level curve.
//!
//! `level = floor(sqrt(xp / 100)) + 1`, so reaching level `n` costs
//! `100 * (n - 1)^2` experience and every level costs more than the last.

/// Experience divisor of the level curve.
pub const XP_PER_LEVEL_UNIT: u64 = 100;

/// Maps accumulated experience to a level. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelCalculator;

impl LevelCalculator {
    /// Level for `experience`. Always at least 1 and never decreasing in `experience`.
    pub fn compute(experience: u64) -> u32 {
        let root = isqrt(experience / XP_PER_LEVEL_UNIT);
        // isqrt(u64::MAX / 100) < 2^32 - 1, so the +1 cannot overflow
        u32::try_from(root).map_or(u32::MAX, |r| r + 1)
    }

    /// Level for a signed experience value. Negative input counts as zero.
    pub fn compute_signed(experience: i64) -> u32 {
        Self::compute(u64::try_from(experience).unwrap_or(0))
    }

    /// Minimum experience required to be at `level`.
    pub fn threshold(level: u32) -> u64 {
        let steps = u64::from(level.saturating_sub(1));
        steps
            .saturating_mul(steps)
            .saturating_mul(XP_PER_LEVEL_UNIT)
    }
}

/// Floor of the square root.
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // Newton's iteration from an upper bound converges monotonically downwards
    let mut x = n;
    let mut y = x / 2 + x % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
