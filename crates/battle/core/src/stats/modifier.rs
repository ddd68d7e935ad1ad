//! Named, time-limited stat modifiers.

use std::collections::BTreeMap;

use super::Stat;
use crate::state::CombatantId;

/// How long an effect lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectDuration {
    /// Expires after the given number of owner turns.
    Turns(u32),
    /// Lasts until explicitly removed or the battle ends.
    Permanent,
}

impl EffectDuration {
    /// Advances by one turn. Returns true once the duration has run out.
    pub fn tick(&mut self) -> bool {
        match self {
            EffectDuration::Turns(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            EffectDuration::Permanent => false,
        }
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            EffectDuration::Turns(remaining) => Some(*remaining),
            EffectDuration::Permanent => None,
        }
    }
}

/// A bundle of attribute deltas and multipliers identified by name.
///
/// The name is the identity used for replace-or-refresh: adding a modifier
/// whose name is already present replaces the old one. Independent sources
/// granting the same conceptual buff must use distinct names (for example by
/// suffixing the source id) to stack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatModifier {
    pub name: String,
    pub flats: BTreeMap<Stat, f64>,
    /// Fractional multipliers: `0.05` means ×1.05.
    pub percents: BTreeMap<Stat, f64>,
    pub duration: EffectDuration,
    pub source: Option<CombatantId>,
}

impl StatModifier {
    /// Creates an empty permanent modifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flats: BTreeMap::new(),
            percents: BTreeMap::new(),
            duration: EffectDuration::Permanent,
            source: None,
        }
    }

    /// Adds a flat delta (builder pattern). Repeated calls for one stat sum.
    pub fn flat(mut self, stat: Stat, delta: f64) -> Self {
        *self.flats.entry(stat).or_insert(0.0) += delta;
        self
    }

    /// Adds a percentage multiplier (builder pattern).
    ///
    /// Repeated calls for one stat within the same modifier compose
    /// multiplicatively, matching how separate modifiers combine.
    pub fn percent(mut self, stat: Stat, fraction: f64) -> Self {
        let entry = self.percents.entry(stat).or_insert(0.0);
        *entry = (1.0 + *entry) * (1.0 + fraction) - 1.0;
        self
    }

    pub fn turns(mut self, turns: u32) -> Self {
        self.duration = EffectDuration::Turns(turns);
        self
    }

    pub fn permanent(mut self) -> Self {
        self.duration = EffectDuration::Permanent;
        self
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn flat_for(&self, stat: Stat) -> Option<f64> {
        self.flats.get(&stat).copied()
    }

    pub fn percent_for(&self, stat: Stat) -> Option<f64> {
        self.percents.get(&stat).copied()
    }

    /// Returns true if the modifier touches the given stat at all.
    pub fn affects(&self, stat: Stat) -> bool {
        self.flats.contains_key(&stat) || self.percents.contains_key(&stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_duration_counts_down() {
        let mut duration = EffectDuration::Turns(2);
        assert!(!duration.tick());
        assert!(duration.tick());
        assert_eq!(duration.remaining(), Some(0));
    }

    #[test]
    fn permanent_never_expires() {
        let mut duration = EffectDuration::Permanent;
        for _ in 0..100 {
            assert!(!duration.tick());
        }
    }

    #[test]
    fn percents_within_one_modifier_compose() {
        let modifier = StatModifier::new("double")
            .percent(Stat::Atk, 0.1)
            .percent(Stat::Atk, 0.1);
        let value = modifier.percent_for(Stat::Atk).unwrap();
        assert!((value - 0.21).abs() < 1e-9);
    }
}
