//! Points arithmetic for answers.

pub const BASE_POINTS: u32 = 100;
pub const MAX_TIME_BONUS: u32 = 50;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

/// Compute the time bonus for a submission `elapsed_ms` after the question
/// became active. Decays linearly from [`MAX_TIME_BONUS`] at 0 ms to 0 at
/// the time limit; submissions at or past the limit earn no bonus.
pub fn time_bonus(elapsed_ms: u64, time_limit_secs: u32) -> u32 {
    let limit_ms = u64::from(time_limit_secs) * 1000;
    if limit_ms == 0 || elapsed_ms >= limit_ms {
        return 0;
    }
    (u64::from(MAX_TIME_BONUS) * (limit_ms - elapsed_ms) / limit_ms) as u32
}

/// Points awarded for a submission. Incorrect answers score zero; correct
/// answers score the base plus the time bonus. There is no lateness
/// penalty: a correct answer past the limit still earns the base.
pub fn award(correct: bool, elapsed_ms: u64, time_limit_secs: u32) -> u32 {
    if !correct {
        return 0;
    }
    BASE_POINTS + time_bonus(elapsed_ms, time_limit_secs)
}
