use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Tunable limits and thresholds for the engine.
///
/// Defaults mirror production behavior; tests override individual fields
/// (struct-update syntax on `Default::default()`).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Smallest accepted transaction amount.
    pub amount_floor: Decimal,
    /// Largest accepted transaction amount.
    pub amount_ceiling: Decimal,
    /// Minimum similarity score for a customer name to count as a match.
    pub match_threshold: f64,
    /// Candidates scoring within this band of the best match are tied.
    pub tie_margin: f64,
    /// Score bonus when two names share a phonetic key.
    pub phonetic_bonus: f64,
    /// Transactions below this extraction confidence are left unverified.
    pub verify_threshold: f64,
    /// Upper bound on a single storage operation before the unit fails.
    pub storage_timeout: Duration,
    /// Upper bound on one notification delivery attempt.
    pub notify_timeout: Duration,
    /// How long the request cycle waits on the notification task before
    /// detaching it.
    pub notify_grace: Duration,
    /// Consecutive channel failures that open the circuit breaker.
    pub breaker_trip: u32,
    /// How long the breaker stays open once tripped.
    pub breaker_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            amount_floor: dec!(0.01),
            amount_ceiling: dec!(10_000_000),
            match_threshold: 0.8,
            tie_margin: 0.03,
            phonetic_bonus: 0.2,
            verify_threshold: 0.7,
            storage_timeout: Duration::from_millis(800),
            notify_timeout: Duration::from_secs(3),
            notify_grace: Duration::from_millis(250),
            breaker_trip: 3,
            breaker_cooldown: Duration::from_secs(300),
        }
    }
}
