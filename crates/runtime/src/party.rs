//! Battle inputs and outputs exchanged with the surrounding game.

use battle_core::{Combatant, CombatantId, EnrageState};
use serde::{Deserialize, Serialize};

/// The player's side going into a battle, plus the economy state the
/// battle carries through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub members: Vec<Combatant>,
    pub gold: u64,
    /// Relic plugin ids.
    pub relics: Vec<String>,
    /// Card plugin ids.
    pub cards: Vec<String>,
}

impl Party {
    pub fn new(members: Vec<Combatant>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    pub fn with_relic(mut self, id: impl Into<String>) -> Self {
        self.relics.push(id.into());
        self
    }

    pub fn with_card(mut self, id: impl Into<String>) -> Self {
        self.cards.push(id.into());
        self
    }

    /// Plugin ids in activation order: relics, then cards.
    pub fn plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.relics.iter().chain(&self.cards).map(String::as_str)
    }

    pub fn is_wiped(&self) -> bool {
        self.members.iter().all(Combatant::is_defeated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub outcome: Outcome,
    /// Party after the battle, battle-scoped effects cleared.
    pub party: Party,
    pub turns: u32,
    /// Foes in the order they were credited.
    pub defeated_foes: Vec<CombatantId>,
    pub enrage: EnrageState,
}

impl BattleResult {
    pub fn is_victory(&self) -> bool {
        self.outcome == Outcome::Victory
    }
}

/// Reward and experience callbacks.
///
/// `foe_defeated` is invoked exactly once per foe id, even if the foe is
/// revived and defeated again.
pub trait RewardHook: Send + Sync {
    fn foe_defeated(&self, foe: &Combatant);

    fn battle_finished(&self, _result: &BattleResult) {}
}
