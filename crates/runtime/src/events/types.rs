//! Battle event taxonomy.
//!
//! Every variant is a contract plugins depend on: changing a payload shape
//! is a breaking change for every card, relic and passive.

use battle_core::{CombatantId, DamageType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form payload extension carried by several events.
pub type Details = Map<String, Value>;

/// Routing key for subscriptions, one per [`BattleEvent`] variant.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    BattleStart,
    BattleEnd,
    TurnStart,
    TurnEnd,
    ActionUsed,
    HitLanded,
    DamageDealt,
    DamageTaken,
    HealReceived,
    EffectApplied,
    EffectRemoved,
    RelicEffect,
    CardEffect,
}

/// Where a point of damage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DamageSource {
    /// An executed action.
    Action,
    /// A damage-over-time tick.
    Periodic,
    /// A plugin reaction.
    Plugin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    BattleStart {
        entity: CombatantId,
    },
    BattleEnd {
        entity: CombatantId,
    },
    TurnStart {
        actor: CombatantId,
        turn: u32,
        bonus: bool,
    },
    TurnEnd {
        actor: CombatantId,
        turn: u32,
    },
    ActionUsed {
        actor: CombatantId,
        action: String,
    },
    HitLanded {
        attacker: CombatantId,
        target: CombatantId,
        amount: i64,
        action_name: String,
    },
    DamageDealt {
        /// `None` for sourceless periodic damage.
        attacker: Option<CombatantId>,
        target: CombatantId,
        amount: i64,
        damage_type: DamageType,
        source: DamageSource,
        source_action: Option<String>,
        action_name: String,
        details: Details,
    },
    DamageTaken {
        target: CombatantId,
        attacker: Option<CombatantId>,
        amount: i64,
        damage_type: DamageType,
        details: Details,
    },
    HealReceived {
        target: CombatantId,
        healer: Option<CombatantId>,
        amount: i64,
        details: Details,
    },
    EffectApplied {
        effect_name: String,
        entity: CombatantId,
        details: Details,
    },
    EffectRemoved {
        effect_name: String,
        entity: CombatantId,
        details: Details,
    },
    RelicEffect {
        id: String,
        entity: CombatantId,
        effect_type: String,
        value: f64,
        details: Details,
    },
    CardEffect {
        id: String,
        entity: CombatantId,
        effect_type: String,
        value: f64,
        details: Details,
    },
}

impl BattleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BattleEvent::BattleStart { .. } => EventKind::BattleStart,
            BattleEvent::BattleEnd { .. } => EventKind::BattleEnd,
            BattleEvent::TurnStart { .. } => EventKind::TurnStart,
            BattleEvent::TurnEnd { .. } => EventKind::TurnEnd,
            BattleEvent::ActionUsed { .. } => EventKind::ActionUsed,
            BattleEvent::HitLanded { .. } => EventKind::HitLanded,
            BattleEvent::DamageDealt { .. } => EventKind::DamageDealt,
            BattleEvent::DamageTaken { .. } => EventKind::DamageTaken,
            BattleEvent::HealReceived { .. } => EventKind::HealReceived,
            BattleEvent::EffectApplied { .. } => EventKind::EffectApplied,
            BattleEvent::EffectRemoved { .. } => EventKind::EffectRemoved,
            BattleEvent::RelicEffect { .. } => EventKind::RelicEffect,
            BattleEvent::CardEffect { .. } => EventKind::CardEffect,
        }
    }

    /// Shorthand for an `effect_applied` event with a single detail field.
    pub fn effect_applied(
        effect_name: impl Into<String>,
        entity: CombatantId,
        category: impl Into<String>,
    ) -> Self {
        BattleEvent::EffectApplied {
            effect_name: effect_name.into(),
            entity,
            details: details([("category", Value::from(category.into()))]),
        }
    }

    pub fn effect_removed(
        effect_name: impl Into<String>,
        entity: CombatantId,
        category: impl Into<String>,
    ) -> Self {
        BattleEvent::EffectRemoved {
            effect_name: effect_name.into(),
            entity,
            details: details([("category", Value::from(category.into()))]),
        }
    }
}

/// Builds a [`Details`] map from key/value pairs.
pub fn details<const N: usize>(pairs: [(&str, Value); N]) -> Details {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
