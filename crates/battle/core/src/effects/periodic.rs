use crate::combat::{DamageFlags, DamageType};
use crate::state::CombatantId;

/// Damage-over-time or heal-over-time instance.
///
/// `source` is a plain id: the effect keeps ticking after its source is
/// defeated and never keeps the source alive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicEffect {
    pub id: String,
    /// Damage or healing per tick.
    pub magnitude: i64,
    /// Ticks left before the effect removes itself.
    pub turns: u32,
    pub source: Option<CombatantId>,
    /// Cap on concurrent instances sharing `id` on one combatant.
    pub max_stacks: Option<u32>,
    pub damage_type: DamageType,
    pub flags: DamageFlags,
}

impl PeriodicEffect {
    pub fn new(id: impl Into<String>, magnitude: i64, turns: u32) -> Self {
        Self {
            id: id.into(),
            magnitude,
            turns,
            source: None,
            max_stacks: None,
            damage_type: DamageType::Generic,
            flags: DamageFlags::DOT,
        }
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = Some(max_stacks);
        self
    }

    pub fn damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    /// Marks the effect as cost damage: it ignores shields.
    pub fn cost_damage(mut self) -> Self {
        self.flags |= DamageFlags::COST;
        self
    }

    pub fn is_cost_damage(&self) -> bool {
        self.flags.contains(DamageFlags::COST)
    }
}

/// One periodic effect firing during [`crate::EffectManager::tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicHit {
    pub effect_id: String,
    pub source: Option<CombatantId>,
    pub damage_type: DamageType,
    /// HP lost (DoT) or gained (HoT).
    pub amount: i64,
    /// Portion soaked by shields (DoT only).
    pub absorbed: i64,
}
