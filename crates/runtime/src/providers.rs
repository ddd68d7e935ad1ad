//! Asynchronous abstraction for choosing actions.
//!
//! The session asks one [`ActionProvider`] per side for each action, so a
//! battle can run with scripted fixtures, AI policies, or human input.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use battle_core::{CombatantId, Stat};

use crate::actions::{ActionRequest, NormalAttack, Ultimate, Wait};
use crate::error::Result;
use crate::state::BattleState;

/// Trait for providing actions based on the current battle state.
///
/// Different implementations can handle:
/// - Auto-battle AI
/// - Scripted or replayed actions
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Chooses the next action for `actor` from a read-only view of the battle.
    async fn provide_action(
        &self,
        actor: CombatantId,
        state: &BattleState,
    ) -> Result<ActionRequest>;
}

/// A provider that always waits. Useful for tests or as a fallback.
pub struct WaitActionProvider;

#[async_trait]
impl ActionProvider for WaitActionProvider {
    async fn provide_action(
        &self,
        _actor: CombatantId,
        _state: &BattleState,
    ) -> Result<ActionRequest> {
        Ok(ActionRequest::wait())
    }
}

/// Default auto-battle policy.
///
/// Fires the ultimate at every living opponent when it is charged and off
/// cooldown; otherwise attacks the living opponent with the lowest HP (ties
/// go to the lower id).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoActionProvider;

impl AutoActionProvider {
    pub fn choose(actor: CombatantId, state: &BattleState) -> ActionRequest {
        let opponents = state.roster.opponents_of(actor);
        if opponents.is_empty() {
            return ActionRequest::wait();
        }

        let ultimate_ready = state
            .roster
            .get(actor)
            .is_some_and(|c| c.ultimate_ready(state.config.ultimate_max))
            && state.cooldowns.remaining(actor, Ultimate::ID) == 0;
        if ultimate_ready {
            return ActionRequest::new(Ultimate::ID, opponents);
        }

        let target = opponents
            .iter()
            .filter_map(|&id| state.roster.get(id))
            .min_by(|a, b| {
                a.hp()
                    .cmp(&b.hp())
                    .then_with(|| a.effective(Stat::Defense).total_cmp(&b.effective(Stat::Defense)))
                    .then(a.id.cmp(&b.id))
            })
            .map(|c| c.id);

        match target {
            Some(target) => ActionRequest::new(NormalAttack::ID, vec![target]),
            None => ActionRequest::new(Wait::ID, Vec::new()),
        }
    }
}

#[async_trait]
impl ActionProvider for AutoActionProvider {
    async fn provide_action(
        &self,
        actor: CombatantId,
        state: &BattleState,
    ) -> Result<ActionRequest> {
        Ok(Self::choose(actor, state))
    }
}

/// Replays a fixed list of requests, then waits.
#[derive(Debug, Default)]
pub struct ScriptedActionProvider {
    script: Mutex<VecDeque<ActionRequest>>,
}

impl ScriptedActionProvider {
    pub fn new(script: impl IntoIterator<Item = ActionRequest>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .map_or(0, |script| script.len())
    }
}

#[async_trait]
impl ActionProvider for ScriptedActionProvider {
    async fn provide_action(
        &self,
        _actor: CombatantId,
        _state: &BattleState,
    ) -> Result<ActionRequest> {
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        Ok(next.unwrap_or_else(ActionRequest::wait))
    }
}
