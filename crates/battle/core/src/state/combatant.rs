use super::ids::{CombatantId, Side};
use super::vitals::{DamageApplied, Vitals};
use crate::combat::DamageFlags;
use crate::effects::{EffectManager, EffectNotice, PeriodicEffect, TickReport};
use crate::error::StatError;
use crate::stats::{BaseStats, Stat, StatModifier};

/// A battle participant.
///
/// HP is clamped to `[0, effective(MaxHp)]` after every mutation. A
/// combatant at 0 HP is defeated: it is skipped by turn order and target
/// selection but stays in the roster so it can be revived and reported.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    base: BaseStats,
    vitals: Vitals,
    /// Action points left this turn.
    pub action_points: u32,
    pub ultimate_charge: u32,
    effects: EffectManager,
}

impl Combatant {
    /// Creates a combatant at full HP.
    pub fn new(id: CombatantId, name: impl Into<String>, side: Side, base: BaseStats) -> Self {
        let hp = base.get(Stat::MaxHp).round().max(0.0) as i64;
        Self {
            id,
            name: name.into(),
            side,
            base,
            vitals: Vitals::new(hp),
            action_points: 0,
            ultimate_charge: 0,
            effects: EffectManager::new(),
        }
    }

    /// Starts the combatant at a specific HP instead of full.
    pub fn with_hp(mut self, hp: i64) -> Self {
        self.set_hp(hp);
        self
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn get_base(&self, stat: Stat) -> f64 {
        self.base.get(stat)
    }

    pub fn set_base(&mut self, stat: Stat, value: f64) -> Result<(), StatError> {
        self.base.set(stat, value)?;
        self.clamp_hp();
        Ok(())
    }

    pub fn base_stats(&self) -> &BaseStats {
        &self.base
    }

    /// Base value combined with every active modifier.
    pub fn effective(&self, stat: Stat) -> f64 {
        self.effects.effective(stat, self.base.get(stat))
    }

    pub fn speed(&self) -> f64 {
        self.effective(Stat::Spd)
    }

    // ========================================================================
    // Vitals
    // ========================================================================

    pub fn hp(&self) -> i64 {
        self.vitals.hp
    }

    pub fn max_hp(&self) -> i64 {
        self.effective(Stat::MaxHp).round() as i64
    }

    pub fn shields(&self) -> i64 {
        self.vitals.shields
    }

    pub fn vitals(&self) -> Vitals {
        self.vitals
    }

    pub fn set_hp(&mut self, hp: i64) {
        self.vitals.hp = hp;
        self.clamp_hp();
    }

    pub fn add_shields(&mut self, amount: i64) {
        self.vitals.shields = (self.vitals.shields + amount).max(0);
    }

    pub fn is_defeated(&self) -> bool {
        self.vitals.hp <= 0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_defeated()
    }

    /// Routes already-mitigated damage through shields into HP.
    pub fn take_damage(&mut self, amount: i64, flags: DamageFlags) -> DamageApplied {
        if self.is_defeated() {
            return DamageApplied::default();
        }
        self.vitals.absorb(amount, flags)
    }

    /// Heals a living combatant. Returns HP actually restored.
    pub fn heal(&mut self, amount: i64) -> i64 {
        if self.is_defeated() {
            return 0;
        }
        let max_hp = self.max_hp();
        self.vitals.restore(amount, max_hp)
    }

    /// Brings a defeated combatant back with `hp` (at least 1).
    ///
    /// Returns false if the combatant was not defeated.
    pub fn revive(&mut self, hp: i64) -> bool {
        if self.is_alive() {
            return false;
        }
        self.vitals.hp = hp.max(1);
        self.clamp_hp();
        true
    }

    fn clamp_hp(&mut self) {
        let max_hp = self.max_hp();
        self.vitals.clamp(max_hp);
    }

    // ========================================================================
    // Effects
    // ========================================================================

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    /// Adds a modifier and re-clamps HP in case max HP dropped.
    pub fn add_modifier(&mut self, modifier: StatModifier) -> EffectNotice {
        let notice = self.effects.add_modifier(modifier);
        self.clamp_hp();
        notice
    }

    pub fn remove_modifier(&mut self, name: &str) -> Option<StatModifier> {
        let removed = self.effects.remove_modifier(name);
        if removed.is_some() {
            self.clamp_hp();
        }
        removed
    }

    pub fn add_dot(&mut self, effect: PeriodicEffect) -> Option<EffectNotice> {
        self.effects.add_dot(effect)
    }

    pub fn add_hot(&mut self, effect: PeriodicEffect) -> Option<EffectNotice> {
        self.effects.add_hot(effect)
    }

    /// Removes effects whose category and name match.
    pub fn cleanse(
        &mut self,
        matches: impl FnMut(crate::effects::EffectCategory, &str) -> bool,
    ) -> Vec<EffectNotice> {
        let notices = self.effects.cleanse(matches);
        self.clamp_hp();
        notices
    }

    /// Runs the once-per-turn effect tick against this combatant's vitals.
    pub fn tick_effects(&mut self) -> TickReport {
        let max_hp = self.max_hp();
        let report = self.effects.tick(&mut self.vitals, max_hp);
        self.clamp_hp();
        report
    }

    /// Drops every effect; used when the battle ends.
    pub fn clear_effects(&mut self) {
        self.effects.clear();
        self.clamp_hp();
    }

    // ========================================================================
    // Turn resources
    // ========================================================================

    /// Spends action points. Returns false (spending nothing) if short.
    pub fn spend_action_points(&mut self, cost: u32) -> bool {
        if self.action_points < cost {
            return false;
        }
        self.action_points -= cost;
        true
    }

    pub fn add_ultimate_charge(&mut self, amount: u32, max: u32) {
        self.ultimate_charge = (self.ultimate_charge + amount).min(max);
    }

    pub fn ultimate_ready(&self, max: u32) -> bool {
        max > 0 && self.ultimate_charge >= max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> Combatant {
        Combatant::new(
            CombatantId(1),
            "hero",
            Side::Party,
            BaseStats::new().with(Stat::MaxHp, 100.0),
        )
    }

    #[test]
    fn starts_at_full_hp() {
        assert_eq!(hero().hp(), 100);
    }

    #[test]
    fn hp_clamps_to_effective_max() {
        let mut hero = hero();
        hero.set_hp(500);
        assert_eq!(hero.hp(), 100);
        hero.set_hp(-5);
        assert_eq!(hero.hp(), 0);
        assert!(hero.is_defeated());
    }

    #[test]
    fn max_hp_debuff_reclamps_current_hp() {
        let mut hero = hero();
        hero.add_modifier(StatModifier::new("frail").percent(Stat::MaxHp, -0.5));
        assert_eq!(hero.max_hp(), 50);
        assert_eq!(hero.hp(), 50);
    }

    #[test]
    fn defeated_cannot_heal_but_can_revive() {
        let mut hero = hero();
        hero.take_damage(1000, DamageFlags::empty());
        assert!(hero.is_defeated());
        assert_eq!(hero.heal(50), 0);
        assert!(hero.revive(30));
        assert_eq!(hero.hp(), 30);
        assert!(!hero.revive(30));
    }

    #[test]
    fn ten_damage_dot_over_two_ticks() {
        let mut hero = hero();
        hero.add_dot(PeriodicEffect::new("poison", 10, 2));

        hero.tick_effects();
        assert_eq!(hero.hp(), 90);
        hero.tick_effects();
        assert_eq!(hero.hp(), 80);
        assert!(hero.effects().dots().is_empty());
    }

    #[test]
    fn action_points_never_go_negative() {
        let mut hero = hero();
        hero.action_points = 1;
        assert!(hero.spend_action_points(1));
        assert!(!hero.spend_action_points(1));
        assert_eq!(hero.action_points, 0);
    }
}
