//! Ability definitions and the registry that executes them.
//!
//! An [`Ability`] is a synchronous unit of game logic: it inspects and
//! mutates [`BattleState`] through an [`ActionContext`] and records the
//! events it caused. The session publishes those events after the ability
//! returns, so abilities never suspend.

mod builtin;
mod cooldown;
mod registry;

pub use builtin::{NormalAttack, Ultimate, Wait};
pub use cooldown::CooldownBook;
pub use registry::{ActionOutcome, ActionRegistry};

use std::collections::BTreeMap;

use battle_core::{Combatant, CombatantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::BattleEvent;
use crate::state::BattleState;

/// A provider's choice for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub targets: Vec<CombatantId>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>, targets: Vec<CombatantId>) -> Self {
        Self {
            action: action.into(),
            targets,
        }
    }

    pub fn wait() -> Self {
        Self::new(Wait::ID, Vec::new())
    }
}

/// What an ability reports back after executing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub damage_dealt: BTreeMap<CombatantId, i64>,
    pub messages: Vec<String>,
    pub metadata: serde_json::Map<String, Value>,
}

impl ActionResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn record_damage(&mut self, target: CombatantId, amount: i64) {
        *self.damage_dealt.entry(target).or_insert(0) += amount;
    }

    pub fn total_damage(&self) -> i64 {
        self.damage_dealt.values().sum()
    }
}

/// Everything an ability may touch while it runs.
pub struct ActionContext<'a> {
    pub actor: CombatantId,
    pub targets: Vec<CombatantId>,
    pub state: &'a mut BattleState,
    events: Vec<BattleEvent>,
}

impl<'a> ActionContext<'a> {
    pub fn new(actor: CombatantId, targets: Vec<CombatantId>, state: &'a mut BattleState) -> Self {
        Self {
            actor,
            targets,
            state,
            events: Vec::new(),
        }
    }

    pub fn actor(&self) -> Option<&Combatant> {
        self.state.roster.get(self.actor)
    }

    /// Requested targets that are living opponents of the actor.
    pub fn living_enemy_targets(&self) -> Vec<CombatantId> {
        let opponents = self.state.roster.opponents_of(self.actor);
        self.targets
            .iter()
            .copied()
            .filter(|id| opponents.contains(id))
            .collect()
    }

    pub fn events_mut(&mut self) -> &mut Vec<BattleEvent> {
        &mut self.events
    }

    pub fn push_event(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub(crate) fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }
}

/// Executable action registered by id.
///
/// Implementations must not deduct action points themselves; the registry
/// charges [`cost`](Self::cost) exactly once after a successful `execute`.
pub trait Ability: Send + Sync {
    fn id(&self) -> &'static str;

    /// Action points consumed.
    fn cost(&self) -> u32 {
        1
    }

    /// Turns (of the actor) before the ability can be used again.
    fn cooldown(&self) -> u32 {
        0
    }

    /// Using this ability also starts the cooldown of every ability sharing
    /// one of these tags.
    fn cooldown_tags(&self) -> &[&'static str] {
        &[]
    }

    /// True when using the ability ends the actor's turn regardless of the
    /// action points left.
    fn ends_turn(&self) -> bool {
        false
    }

    fn can_execute(&self, ctx: &ActionContext<'_>) -> bool;

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult;
}
