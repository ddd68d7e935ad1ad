use std::collections::BTreeMap;

use battle_core::CombatantId;

/// Remaining cooldowns keyed by actor, then by action id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownBook {
    remaining: BTreeMap<CombatantId, BTreeMap<String, u32>>,
}

impl CooldownBook {
    pub fn remaining(&self, actor: CombatantId, action: &str) -> u32 {
        self.remaining
            .get(&actor)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0)
    }

    /// Starts (or extends) a cooldown. A shorter new cooldown never cuts an
    /// existing one short.
    pub fn start(&mut self, actor: CombatantId, action: &str, turns: u32) {
        if turns == 0 {
            return;
        }
        let entry = self
            .remaining
            .entry(actor)
            .or_default()
            .entry(action.to_string())
            .or_insert(0);
        *entry = (*entry).max(turns);
    }

    /// Counts down every cooldown of `actor` by one turn.
    pub fn tick(&mut self, actor: CombatantId) {
        let Some(actions) = self.remaining.get_mut(&actor) else {
            return;
        };
        actions.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
        if actions.is_empty() {
            self.remaining.remove(&actor);
        }
    }

    pub fn clear(&mut self, actor: CombatantId) {
        self.remaining.remove(&actor);
    }
}
