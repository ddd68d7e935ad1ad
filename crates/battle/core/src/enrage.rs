//! Enrage: escalating pressure that bounds battle length.
//!
//! ```text
//! inactive ──(turn > threshold)──▶ active ──(turn ≥ max_turns)──▶ exhausted
//! ```
//!
//! Once active the controller never deactivates during the battle. Each
//! active turn adds a stack; foes receive an `enrage` modifier scaled by the
//! stack count, and past `bleed_after_stacks` the party starts bleeding.

use crate::config::EnrageConfig;
use crate::effects::PeriodicEffect;
use crate::stats::{Stat, StatModifier};

/// Name of the foe modifier refreshed every enraged turn.
pub const ENRAGE_MODIFIER: &str = "enrage";
/// Id of the bleed applied to party members.
pub const ENRAGE_BLEED: &str = "enrage_bleed";

/// Observable enrage state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnrageState {
    pub active: bool,
    pub stacks: u32,
    pub turn: u32,
    pub threshold: u32,
    pub max_turns: u32,
}

/// Bleed to apply to each living party member this turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartyBleed {
    pub fraction_of_max_hp: f64,
    pub turns: u32,
    pub max_stacks: u32,
}

impl PartyBleed {
    /// Builds the bleed instance for a victim with the given max HP.
    pub fn effect_for(&self, max_hp: i64) -> PeriodicEffect {
        let magnitude = ((max_hp as f64) * self.fraction_of_max_hp).round().max(1.0) as i64;
        PeriodicEffect::new(ENRAGE_BLEED, magnitude, self.turns)
            .max_stacks(self.max_stacks)
            .cost_damage()
    }
}

/// What the turn loop must apply after [`EnrageController::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrageTick {
    /// True only on the turn enrage switched on.
    pub activated: bool,
    pub foe_modifier: Option<StatModifier>,
    pub party_bleed: Option<PartyBleed>,
    /// The turn limit was reached.
    pub exhausted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnrageController {
    config: EnrageConfig,
    state: EnrageState,
}

impl EnrageController {
    pub fn new(config: EnrageConfig) -> Self {
        Self {
            state: EnrageState {
                max_turns: config.max_turns,
                ..EnrageState::default()
            },
            config,
        }
    }

    /// Resets for a new battle with `foe_count` foes.
    pub fn begin(&mut self, foe_count: usize) {
        let foes = u32::try_from(foe_count).unwrap_or(u32::MAX);
        let threshold = self
            .config
            .base_threshold
            .saturating_add(self.config.per_foe_threshold.saturating_mul(foes))
            .min(self.config.max_threshold.max(self.config.base_threshold));

        self.state = EnrageState {
            active: false,
            stacks: 0,
            turn: 0,
            threshold,
            max_turns: self.config.max_turns,
        };
    }

    pub fn state(&self) -> &EnrageState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Records one elapsed turn and reports what to apply.
    pub fn advance(&mut self) -> EnrageTick {
        let mut tick = EnrageTick::default();
        self.state.turn = self.state.turn.saturating_add(1);

        if !self.state.active && self.state.turn > self.state.threshold {
            self.state.active = true;
            tick.activated = true;
        }

        if self.state.active {
            self.state.stacks = self.state.stacks.saturating_add(1);
            tick.foe_modifier = Some(
                StatModifier::new(ENRAGE_MODIFIER)
                    .percent(Stat::Atk, self.config.atk_per_stack * self.state.stacks as f64)
                    .permanent(),
            );

            if self.state.stacks > self.config.bleed_after_stacks {
                let since = self.state.stacks - self.config.bleed_after_stacks - 1;
                if since % self.config.bleed_interval.max(1) == 0 {
                    tick.party_bleed = Some(PartyBleed {
                        fraction_of_max_hp: self.config.bleed_fraction,
                        turns: self.config.bleed_turns,
                        max_stacks: self.config.bleed_max_stacks,
                    });
                }
            }
        }

        tick.exhausted = self.state.max_turns > 0 && self.state.turn >= self.state.max_turns;
        tick
    }
}
