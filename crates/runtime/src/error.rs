//! Error types surfaced by the battle runtime.
//!
//! Plugin failures are isolated at the handler boundary; everything that
//! would leave combat state inconsistent surfaces as a [`BattleError`] and
//! aborts the battle task.
use std::time::Duration;

use battle_core::{CombatantId, QueueError};
use thiserror::Error;

use crate::events::{BattleEvent, EventKind};

pub type Result<T> = std::result::Result<T, BattleError>;

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("battle needs at least one party member and one foe")]
    NoCombatants,

    #[error("duplicate combatant id {0}")]
    DuplicateCombatant(CombatantId),

    #[error(
        "turn {turn} exceeded {timeout:?} (actor {actor:?}, {} recent events)",
        .recent_events.len()
    )]
    TurnTimeout {
        actor: Option<CombatantId>,
        turn: u32,
        timeout: Duration,
        recent_events: Vec<BattleEvent>,
    },

    #[error("critical handler `{handler}` failed on {event}")]
    Handler {
        handler: String,
        event: EventKind,
        #[source]
        source: HandlerError,
    },

    #[error("batched events still pending after {passes} passes ({pending} queued)")]
    EventStorm { passes: u32, pending: usize },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("structural failure: {0}")]
    Structural(String),

    #[error("action provider failed for {actor}: {reason}")]
    Provider { actor: CombatantId, reason: String },

    #[error("battle cancelled")]
    Cancelled,

    #[error("battle task join failed")]
    Join(#[source] tokio::task::JoinError),
}

/// Why an action could not run. Nothing is deducted when `run` fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("unknown combatant {0}")]
    UnknownActor(CombatantId),

    #[error("{0} is defeated")]
    ActorDefeated(CombatantId),

    #[error("`{action}` is on cooldown for {actor} ({remaining} turns)")]
    OnCooldown {
        action: String,
        actor: CombatantId,
        remaining: u32,
    },

    #[error("`{action}` cannot be executed by {actor}")]
    CannotExecute { action: String, actor: CombatantId },

    #[error("`{action}` needs {needed} action points, {actor} has {available}")]
    InsufficientActionPoints {
        action: String,
        actor: CombatantId,
        needed: u32,
        available: u32,
    },
}

/// Failure returned by an event handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }

    /// Converts a caught panic payload.
    pub fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        HandlerError::Panicked(message)
    }
}
