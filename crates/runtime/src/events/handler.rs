//! Event handler trait and the context handlers mutate the battle through.

use async_trait::async_trait;
use battle_core::CombatantId;

use super::bus::EventBus;
use super::types::BattleEvent;
use crate::error::HandlerError;
use crate::state::BattleState;

/// Defines how a handler failure is treated.
///
/// - Critical handlers must succeed or the battle aborts
/// - Important handlers log errors but allow continuation
/// - Optional handlers can fail quietly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerCriticality {
    /// Failure aborts the battle.
    ///
    /// Use for engine handlers that keep combat state consistent.
    Critical,

    /// Failure is logged at error level and the handler is skipped.
    ///
    /// This is the default and the right level for plugin reactions.
    #[default]
    Important,

    /// Failure is logged at debug level.
    ///
    /// Use for cosmetic reactions (telemetry, flavour text).
    Optional,
}

/// Reacts to one kind of [`BattleEvent`].
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    fn criticality(&self) -> HandlerCriticality {
        HandlerCriticality::Important
    }

    async fn handle(
        &self,
        event: &BattleEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError>;
}

/// Mutable view of the battle handed to handlers.
///
/// Handlers may change any battle state but can only emit through
/// [`emit_batched`](Self::emit_batched).
pub struct HandlerContext<'a> {
    pub state: &'a mut BattleState,
    bus: &'a EventBus,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(state: &'a mut BattleState, bus: &'a EventBus) -> Self {
        Self { state, bus }
    }

    /// Queues `event` for the next flush pass.
    pub fn emit_batched(&self, event: BattleEvent) {
        self.bus.emit_batched(event);
    }

    /// Queues several events, preserving their order.
    pub fn emit_all_batched(&self, events: impl IntoIterator<Item = BattleEvent>) {
        for event in events {
            self.bus.emit_batched(event);
        }
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.state.roster.is_alive(id)
    }
}

/// Adapter turning a synchronous closure into an [`EventHandler`].
pub struct FnHandler<F> {
    name: String,
    criticality: HandlerCriticality,
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(name: impl Into<String>, criticality: HandlerCriticality, f: F) -> Self {
        Self {
            name: name.into(),
            criticality,
            f,
        }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&BattleEvent, &mut HandlerContext<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn criticality(&self) -> HandlerCriticality {
        self.criticality
    }

    async fn handle(
        &self,
        event: &BattleEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        (self.f)(event, ctx)
    }
}
