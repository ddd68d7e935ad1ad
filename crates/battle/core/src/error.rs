//! Structural errors raised by the deterministic core.
//!
//! These indicate invariant violations (corrupted queue, non-finite stats)
//! rather than gameplay outcomes. The runtime treats every one of them as
//! fatal to the battle that produced it.

use crate::state::CombatantId;
use crate::stats::Stat;

/// Errors raised by [`crate::ActionQueue`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("combatant {0} is not in the action queue")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} is already in the action queue")]
    DuplicateCombatant(CombatantId),

    #[error("combatant {id} has invalid speed {speed}")]
    InvalidSpeed { id: CombatantId, speed: f64 },

    #[error("combatant {id} has invalid action value {value}")]
    InvalidActionValue { id: CombatantId, value: f64 },
}

/// Errors raised when writing stat values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StatError {
    #[error("stat {stat} cannot be set to non-finite value {value}")]
    NonFinite { stat: Stat, value: f64 },
}
