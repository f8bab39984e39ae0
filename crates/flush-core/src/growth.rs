//! Fruit growth within a flush under the two decay policies.
//!
//! Both curves take the weeks elapsed in the current flush `t`, the flush
//! index, the weeks a flush needs to mature and the block's lifetime yield
//! cap, and return whole grams rounded half-to-even.

use crate::config::DecayMode;

/// Number of flushes a block can produce before it stops growing.
pub const MAX_FLUSHES: u32 = 3;

/// Real root of `x + x^2 + x^3 = 1`: three flushes decaying by this ratio
/// sum to the lifetime cap.
pub const EXPONENTIAL_DECAY_RATE: f64 = 0.54368;

/// Dispatch to the curve selected by `mode`.
pub fn grow(
    mode: DecayMode,
    t: f64,
    flush: u32,
    time_to_fruit: f64,
    max_lifetime_yield: f64,
) -> f64 {
    match mode {
        DecayMode::Linear => linear_growth(t, flush, time_to_fruit, max_lifetime_yield),
        DecayMode::Exponential => exponential_growth(t, flush, time_to_fruit, max_lifetime_yield),
    }
}

/// Share of the lifetime cap available to `flush` under linear decay.
pub fn linear_flush_yield(flush: u32, max_lifetime_yield: f64) -> f64 {
    let remaining = MAX_FLUSHES.saturating_sub(flush) as f64;
    remaining / 6.0 * max_lifetime_yield
}

/// Linear growth towards the flush yield, saturating after `time_to_fruit` weeks.
///
/// Flush 0 gets 3/6 of the cap, flush 1 gets 2/6, flush 2 gets 1/6 and any
/// later flush nothing.
pub fn linear_growth(t: f64, flush: u32, time_to_fruit: f64, max_lifetime_yield: f64) -> f64 {
    let yield_for_flush = linear_flush_yield(flush, max_lifetime_yield);
    let progress = (t / time_to_fruit).clamp(0.0, 1.0);
    (yield_for_flush * progress).round_ties_even()
}

/// Share of the lifetime cap available to `flush` under exponential decay.
pub fn exponential_flush_yield(flush: u32, max_lifetime_yield: f64) -> f64 {
    max_lifetime_yield * EXPONENTIAL_DECAY_RATE.powi(flush as i32 + 1)
}

/// Saturating growth `y - y * r^t` towards the flush yield `y`.
///
/// The curve never reaches `y`; `r` is chosen so it is one gram short of it
/// after `time_to_fruit` weeks, where it stops.
pub fn exponential_growth(
    t: f64,
    flush: u32,
    time_to_fruit: f64,
    max_lifetime_yield: f64,
) -> f64 {
    let yield_for_flush = exponential_flush_yield(flush, max_lifetime_yield);
    if yield_for_flush <= 0.0 {
        return 0.0;
    }
    let rate = (1.0 / yield_for_flush).powf(1.0 / time_to_fruit);
    let progress = t.clamp(0.0, time_to_fruit);
    let weight = (yield_for_flush - yield_for_flush * rate.powf(progress)).round_ties_even();
    weight.max(0.0)
}
