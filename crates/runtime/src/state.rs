//! Mutable state of one battle.
//!
//! A [`BattleState`] is owned by exactly one session. Abilities and handlers
//! borrow it mutably; nothing in it is shared with another battle.

use battle_core::combat::{self, DamageRoll};
use battle_core::{
    ActionQueue, BattleConfig, BattleRng, CombatantId, DamageFlags, DamageType, EnrageController,
    PeriodicEffect, QueueError, Roster, Side, StatModifier,
};
use serde_json::Value;

use crate::actions::CooldownBook;
use crate::events::{BattleEvent, DamageSource, details};
use crate::plugins::PluginState;

/// Which side the current actor belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BattlePhase {
    PlayerPhase,
    FoePhase,
    BattleOver,
}

impl BattlePhase {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Party => BattlePhase::PlayerPhase,
            Side::Foe => BattlePhase::FoePhase,
        }
    }
}

#[derive(Debug)]
pub struct BattleState {
    pub roster: Roster,
    pub queue: ActionQueue,
    pub rng: BattleRng,
    pub config: BattleConfig,
    pub enrage: EnrageController,
    pub cooldowns: CooldownBook,
    /// Typed per-battle plugin state.
    pub plugins: PluginState,
    pub phase: BattlePhase,
    /// Turns started so far, bonus turns included.
    pub turn: u32,
}

impl BattleState {
    /// Builds the state for a fresh battle: queue seeded from `rng`, enrage
    /// threshold derived from the foe count.
    pub fn new(
        roster: Roster,
        config: BattleConfig,
        mut rng: BattleRng,
    ) -> Result<Self, QueueError> {
        let queue = ActionQueue::from_config(
            &config,
            roster.iter().map(|c| (c.id, c.speed())),
            &mut rng,
        )?;
        let mut enrage = EnrageController::new(config.enrage.clone());
        enrage.begin(roster.side(Side::Foe).count());

        Ok(Self {
            roster,
            queue,
            rng,
            config,
            enrage,
            cooldowns: CooldownBook::default(),
            plugins: PluginState::default(),
            phase: BattlePhase::PlayerPhase,
            turn: 0,
        })
    }

    /// Rolls and applies a direct hit, appending the resulting events.
    ///
    /// Returns `None` if either combatant is missing or defeated.
    pub fn strike(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        multiplier: f64,
        action_name: &str,
        damage_type: DamageType,
        out: &mut Vec<BattleEvent>,
    ) -> Option<DamageRoll> {
        let roll = {
            let a = self.roster.get(attacker).filter(|c| c.is_alive())?;
            let t = self.roster.get(target).filter(|c| c.is_alive())?;
            combat::roll_attack(a, t, multiplier, &self.config, &mut self.rng)
        };
        if roll.dodged {
            return Some(roll);
        }

        let applied = self.roster.get_mut(target)?.take_damage(roll.amount, roll.flags);
        out.push(BattleEvent::HitLanded {
            attacker,
            target,
            amount: roll.amount,
            action_name: action_name.to_string(),
        });
        out.push(BattleEvent::DamageDealt {
            attacker: Some(attacker),
            target,
            amount: roll.amount,
            damage_type,
            source: DamageSource::Action,
            source_action: Some(action_name.to_string()),
            action_name: action_name.to_string(),
            details: details([
                ("crit", Value::from(roll.is_crit())),
                ("absorbed", Value::from(applied.absorbed)),
            ]),
        });
        out.push(BattleEvent::DamageTaken {
            target,
            attacker: Some(attacker),
            amount: roll.amount,
            damage_type,
            details: details([
                ("absorbed", Value::from(applied.absorbed)),
                ("hp_lost", Value::from(applied.hp_lost)),
            ]),
        });
        Some(roll)
    }

    /// Applies already-computed damage (plugin reactions, reflected damage).
    ///
    /// `flags` decide whether mitigation and shields apply. Returns the
    /// damage after mitigation, or 0 if the target is missing or defeated.
    #[allow(clippy::too_many_arguments)]
    pub fn deal_damage(
        &mut self,
        attacker: Option<CombatantId>,
        target: CombatantId,
        raw: f64,
        damage_type: DamageType,
        flags: DamageFlags,
        action_name: &str,
        out: &mut Vec<BattleEvent>,
    ) -> i64 {
        let Some(victim) = self.roster.get(target).filter(|c| c.is_alive()) else {
            return 0;
        };
        let amount = combat::mitigate(raw, victim, flags, &self.config);
        let Some(victim) = self.roster.get_mut(target) else {
            return 0;
        };
        let applied = victim.take_damage(amount, flags);

        out.push(BattleEvent::DamageDealt {
            attacker,
            target,
            amount,
            damage_type,
            source: DamageSource::Plugin,
            source_action: None,
            action_name: action_name.to_string(),
            details: details([("absorbed", Value::from(applied.absorbed))]),
        });
        out.push(BattleEvent::DamageTaken {
            target,
            attacker,
            amount,
            damage_type,
            details: details([
                ("absorbed", Value::from(applied.absorbed)),
                ("hp_lost", Value::from(applied.hp_lost)),
            ]),
        });
        amount
    }

    /// Heals a living combatant, scaled by its vitality. Returns HP restored.
    pub fn heal(
        &mut self,
        healer: Option<CombatantId>,
        target: CombatantId,
        raw: f64,
        out: &mut Vec<BattleEvent>,
    ) -> i64 {
        let Some(receiver) = self.roster.get_mut(target) else {
            return 0;
        };
        let amount = combat::heal_amount(raw, receiver);
        let healed = receiver.heal(amount);
        if healed > 0 {
            out.push(BattleEvent::HealReceived {
                target,
                healer,
                amount: healed,
                details: details([("overheal", Value::from(amount - healed))]),
            });
        }
        healed
    }

    /// Adds or refreshes a modifier and keeps the queue baseline in sync
    /// with any speed change.
    pub fn apply_modifier(
        &mut self,
        target: CombatantId,
        modifier: StatModifier,
        out: &mut Vec<BattleEvent>,
    ) -> Result<(), QueueError> {
        let Some(combatant) = self.roster.get_mut(target) else {
            return Err(QueueError::UnknownCombatant(target));
        };
        let notice = combatant.add_modifier(modifier);
        let speed = combatant.speed();
        out.push(BattleEvent::effect_applied(
            notice.name,
            target,
            notice.category.to_string(),
        ));
        if self.queue.contains(target) {
            self.queue.sync_speed(target, speed)?;
        }
        Ok(())
    }

    pub fn remove_modifier(
        &mut self,
        target: CombatantId,
        name: &str,
        out: &mut Vec<BattleEvent>,
    ) -> Result<bool, QueueError> {
        let Some(combatant) = self.roster.get_mut(target) else {
            return Err(QueueError::UnknownCombatant(target));
        };
        let Some(removed) = combatant.remove_modifier(name) else {
            return Ok(false);
        };
        let speed = combatant.speed();
        out.push(BattleEvent::effect_removed(removed.name, target, "modifier"));
        if self.queue.contains(target) {
            self.queue.sync_speed(target, speed)?;
        }
        Ok(true)
    }

    /// Applies a damage-over-time effect. Returns false if nothing changed.
    pub fn apply_dot(
        &mut self,
        target: CombatantId,
        effect: PeriodicEffect,
        out: &mut Vec<BattleEvent>,
    ) -> bool {
        let Some(notice) = self
            .roster
            .get_mut(target)
            .filter(|c| c.is_alive())
            .and_then(|c| c.add_dot(effect))
        else {
            return false;
        };
        out.push(BattleEvent::effect_applied(
            notice.name,
            target,
            notice.category.to_string(),
        ));
        true
    }

    pub fn apply_hot(
        &mut self,
        target: CombatantId,
        effect: PeriodicEffect,
        out: &mut Vec<BattleEvent>,
    ) -> bool {
        let Some(notice) = self
            .roster
            .get_mut(target)
            .filter(|c| c.is_alive())
            .and_then(|c| c.add_hot(effect))
        else {
            return false;
        };
        out.push(BattleEvent::effect_applied(
            notice.name,
            target,
            notice.category.to_string(),
        ));
        true
    }

    /// Brings a defeated combatant back and re-admits it to the queue.
    pub fn revive(&mut self, id: CombatantId, hp: i64) -> Result<bool, QueueError> {
        let Some(combatant) = self.roster.get_mut(id) else {
            return Err(QueueError::UnknownCombatant(id));
        };
        if !combatant.revive(hp) {
            return Ok(false);
        }
        let speed = combatant.speed();
        if !self.queue.contains(id) {
            self.queue.insert(id, speed)?;
        }
        Ok(true)
    }

    pub fn grant_extra_turn(&mut self, id: CombatantId) -> Result<(), QueueError> {
        self.queue.grant_extra_turn(id)
    }

    pub fn is_over(&self) -> bool {
        self.phase == BattlePhase::BattleOver
    }
}
