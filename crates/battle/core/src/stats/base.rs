//! Base attributes of a combatant.

use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

use crate::error::StatError;

/// Attributes every combatant carries.
///
/// Rates (`CritRate`, `Dodge`, `EffectHitRate`, `EffectResistance`) are
/// fractions in `[0, 1]`; `CritDamage`, `Mitigation` and `Vitality` are
/// multipliers centred on `1.0`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stat {
    MaxHp,
    Atk,
    Defense,
    Spd,
    CritRate,
    CritDamage,
    Mitigation,
    Dodge,
    EffectHitRate,
    EffectResistance,
    Vitality,
    Regain,
}

impl Stat {
    /// Default base value for a freshly created combatant.
    pub const fn default_value(self) -> f64 {
        match self {
            Stat::MaxHp => 1000.0,
            Stat::Atk => 100.0,
            Stat::Defense => 50.0,
            Stat::Spd => 100.0,
            Stat::CritRate => 0.05,
            Stat::CritDamage => 2.0,
            Stat::Mitigation => 1.0,
            Stat::Dodge => 0.0,
            Stat::EffectHitRate => 1.0,
            Stat::EffectResistance => 0.0,
            Stat::Vitality => 1.0,
            Stat::Regain => 0.0,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Base attribute values, indexed by [`Stat`].
///
/// Base values change only through [`BaseStats::set`]; everything temporary
/// goes through modifiers instead.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    values: [f64; Stat::COUNT],
}

impl BaseStats {
    pub fn new() -> Self {
        let mut values = [0.0; Stat::COUNT];
        for stat in Stat::iter() {
            values[stat.index()] = stat.default_value();
        }
        Self { values }
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: f64) -> Result<(), StatError> {
        if !value.is_finite() {
            return Err(StatError::NonFinite { stat, value });
        }
        self.values[stat.index()] = value;
        Ok(())
    }

    /// Builder-style setter for templates and tests.
    ///
    /// Non-finite values are ignored.
    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        if value.is_finite() {
            self.values[stat.index()] = value;
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::iter().map(|stat| (stat, self.get(stat)))
    }
}

impl Default for BaseStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let stats = BaseStats::new();
        assert_eq!(stats.get(Stat::MaxHp), 1000.0);
        assert_eq!(stats.get(Stat::Spd), 100.0);
        assert_eq!(stats.get(Stat::Vitality), 1.0);
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut stats = BaseStats::new();
        assert!(matches!(
            stats.set(Stat::Atk, f64::NAN),
            Err(StatError::NonFinite { stat: Stat::Atk, .. })
        ));
        assert_eq!(stats.get(Stat::Atk), 100.0);
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Stat::EffectHitRate.to_string(), "effect_hit_rate");
        assert_eq!("max_hp".parse::<Stat>(), Ok(Stat::MaxHp));
    }
}
