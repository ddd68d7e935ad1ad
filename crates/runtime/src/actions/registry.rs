//! Registry mapping action ids to abilities.

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::CombatantId;
use tracing::debug;

use super::{Ability, ActionContext, ActionRequest, ActionResult, NormalAttack, Ultimate, Wait};
use crate::error::ActionError;
use crate::events::BattleEvent;
use crate::state::BattleState;

/// Result of a successful [`ActionRegistry::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: String,
    pub result: ActionResult,
    /// Events the ability caused, in order, not yet published.
    pub events: Vec<BattleEvent>,
    pub cost: u32,
    pub ends_turn: bool,
}

/// Explicit table of abilities, built once at startup and shared by every
/// battle. Per-battle cooldowns live in [`BattleState::cooldowns`].
#[derive(Clone, Default)]
pub struct ActionRegistry {
    abilities: HashMap<&'static str, Arc<dyn Ability>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `normal_attack`, `ultimate` and `wait`.
    pub fn with_builtin_actions() -> Self {
        let mut registry = Self::new();
        registry.register(NormalAttack::default());
        registry.register(Ultimate::default());
        registry.register(Wait);
        registry
    }

    /// Adds an ability, replacing any ability with the same id.
    pub fn register(&mut self, ability: impl Ability + 'static) -> &mut Self {
        self.abilities.insert(ability.id(), Arc::new(ability));
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Ability>> {
        self.abilities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.abilities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Runs one action for `actor`.
    ///
    /// Order: lookup, cooldown, `can_execute`, action points, `execute`,
    /// then the cost is deducted exactly once and cooldowns start for the
    /// action and for every registered action sharing one of its tags.
    /// On error nothing is executed or deducted.
    pub fn run(
        &self,
        request: &ActionRequest,
        actor: CombatantId,
        state: &mut BattleState,
    ) -> Result<ActionOutcome, ActionError> {
        let id = request.action.as_str();
        let ability = self
            .get(id)
            .cloned()
            .ok_or_else(|| ActionError::UnknownAction(id.to_string()))?;

        let remaining = state.cooldowns.remaining(actor, id);
        if remaining > 0 {
            return Err(ActionError::OnCooldown {
                action: id.to_string(),
                actor,
                remaining,
            });
        }

        let combatant = state
            .roster
            .get(actor)
            .ok_or(ActionError::UnknownActor(actor))?;
        if combatant.is_defeated() {
            return Err(ActionError::ActorDefeated(actor));
        }
        let available = combatant.action_points;

        let mut ctx = ActionContext::new(actor, request.targets.clone(), state);
        if !ability.can_execute(&ctx) {
            return Err(ActionError::CannotExecute {
                action: id.to_string(),
                actor,
            });
        }

        let cost = ability.cost();
        if available < cost {
            return Err(ActionError::InsufficientActionPoints {
                action: id.to_string(),
                actor,
                needed: cost,
                available,
            });
        }

        let result = ability.execute(&mut ctx);
        let events = ctx.into_events();

        if let Some(combatant) = state.roster.get_mut(actor) {
            combatant.spend_action_points(cost);
        }
        self.start_cooldowns(ability.as_ref(), actor, state);

        debug!(
            target: "battle::actions",
            action = id,
            actor = %actor,
            cost,
            success = result.success,
            damage = result.total_damage(),
            "action executed"
        );

        Ok(ActionOutcome {
            action: id.to_string(),
            result,
            events,
            cost,
            ends_turn: ability.ends_turn(),
        })
    }

    fn start_cooldowns(&self, used: &dyn Ability, actor: CombatantId, state: &mut BattleState) {
        let turns = used.cooldown();
        if turns == 0 {
            return;
        }
        state.cooldowns.start(actor, used.id(), turns);

        let tags = used.cooldown_tags();
        if tags.is_empty() {
            return;
        }
        for other in self.abilities.values() {
            let shares_tag = other.cooldown_tags().iter().any(|tag| tags.contains(tag));
            if other.id() != used.id() && shares_tag {
                state.cooldowns.start(actor, other.id(), turns);
            }
        }
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("abilities", &self.ids())
            .finish()
    }
}
