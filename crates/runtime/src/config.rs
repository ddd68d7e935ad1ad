//! Runtime configuration for a battle session.

use std::time::Duration;

use battle_core::BattleConfig;

/// Pacing for batched event delivery.
///
/// Small backlogs are flushed after a cooperative yield; larger ones wait
/// `per_event_delay` for each event past `small_batch`, capped at
/// `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub small_batch: usize,
    pub per_event_delay: Duration,
    pub max_delay: Duration,
    /// Passes allowed per flush before the backlog counts as an event storm.
    pub max_passes: u32,
}

impl BatchConfig {
    pub const DEFAULT_SMALL_BATCH: usize = 8;
    pub const DEFAULT_PER_EVENT_DELAY: Duration = Duration::from_micros(50);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(5);
    pub const DEFAULT_MAX_PASSES: u32 = 64;

    /// Delay before the next pass given the size of the pending backlog.
    pub fn delay_for(&self, pending: usize) -> Duration {
        if pending <= self.small_batch {
            return Duration::ZERO;
        }
        let over = u32::try_from(pending - self.small_batch).unwrap_or(u32::MAX);
        self.per_event_delay
            .saturating_mul(over)
            .min(self.max_delay)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            small_batch: Self::DEFAULT_SMALL_BATCH,
            per_event_delay: Self::DEFAULT_PER_EVENT_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            max_passes: Self::DEFAULT_MAX_PASSES,
        }
    }
}

/// Runtime configuration shared across the session, bus and registry.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Seed for the battle RNG; equal seeds replay equal battles.
    pub seed: u64,
    /// Wall-clock ceiling for one turn iteration.
    pub turn_timeout: Duration,
    /// Recent events kept for timeout diagnostics.
    pub event_log_capacity: usize,
    /// Guard against zero-cost actions looping within a turn.
    pub max_actions_per_turn: u32,
    pub batch: BatchConfig,
}

impl RuntimeConfig {
    pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 256;
    pub const DEFAULT_MAX_ACTIONS_PER_TURN: u32 = 16;

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_battle(mut self, battle: BattleConfig) -> Self {
        self.battle = battle;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            seed: 0,
            turn_timeout: Self::DEFAULT_TURN_TIMEOUT,
            event_log_capacity: Self::DEFAULT_EVENT_LOG_CAPACITY,
            max_actions_per_turn: Self::DEFAULT_MAX_ACTIONS_PER_TURN,
            batch: BatchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_batches_only_yield() {
        let batch = BatchConfig::default();
        assert_eq!(batch.delay_for(0), Duration::ZERO);
        assert_eq!(batch.delay_for(batch.small_batch), Duration::ZERO);
    }

    #[test]
    fn delay_grows_with_backlog_and_caps() {
        let batch = BatchConfig::default();
        let a = batch.delay_for(batch.small_batch + 1);
        let b = batch.delay_for(batch.small_batch + 10);
        assert!(a > Duration::ZERO);
        assert!(b > a);
        assert_eq!(batch.delay_for(1_000_000), batch.max_delay);
    }
}
