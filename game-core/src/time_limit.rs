/// Seconds on the clock at the start of the first turn
pub const BASE_TIME_LIMIT: u32 = 10;

/// The clock never starts a turn below this
pub const MIN_TIME_LIMIT: u32 = 3;

const RULES_PER_STEP: u32 = 4;
const SECONDS_PER_STEP: u32 = 2;

/// Turn length after `rules_completed` successful turns.
///
/// Starts at ten seconds and loses two seconds for every four completed
/// rules, never dropping under three.
pub fn time_limit_for(rules_completed: u32) -> u32 {
    let reduction = (rules_completed / RULES_PER_STEP).saturating_mul(SECONDS_PER_STEP);
    BASE_TIME_LIMIT
        .saturating_sub(reduction)
        .max(MIN_TIME_LIMIT)
}
