use std::collections::BTreeMap;

use super::notice::{EffectCategory, EffectNotice, EffectSummary, NoticeKind};
use super::periodic::{PeriodicEffect, PeriodicHit};
use crate::combat::DamageFlags;
use crate::state::Vitals;
use crate::stats::{self, Stat, StatModifier};

/// Everything that happened during one [`EffectManager::tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub damage: Vec<PeriodicHit>,
    pub healing: Vec<PeriodicHit>,
    /// Notices in the order the changes were made.
    pub notices: Vec<EffectNotice>,
}

impl TickReport {
    pub fn total_damage(&self) -> i64 {
        self.damage.iter().map(|hit| hit.amount).sum()
    }

    pub fn total_healing(&self) -> i64 {
        self.healing.iter().map(|hit| hit.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.damage.is_empty() && self.healing.is_empty() && self.notices.is_empty()
    }
}

/// Owner of a combatant's modifiers, DoTs and HoTs.
///
/// # Stacking
///
/// - Modifiers: same name replaces (refresh), distinct names stack.
/// - DoT/HoT: instances sharing an id stack up to `max_stacks`; at the cap
///   the oldest instance is replaced and the remaining ones are refreshed to
///   the new instance's duration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectManager {
    modifiers: Vec<StatModifier>,
    dots: Vec<PeriodicEffect>,
    hots: Vec<PeriodicEffect>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Adds a modifier, replacing any modifier with the same name.
    pub fn add_modifier(&mut self, modifier: StatModifier) -> EffectNotice {
        let remaining = modifier.duration.remaining();
        let name = modifier.name.clone();

        let kind = match self.modifiers.iter_mut().find(|m| m.name == modifier.name) {
            Some(existing) => {
                *existing = modifier;
                NoticeKind::Refreshed
            }
            None => {
                self.modifiers.push(modifier);
                NoticeKind::Applied
            }
        };

        EffectNotice::new(kind, EffectCategory::Modifier, name).with_remaining(remaining)
    }

    /// Removes a modifier by name.
    ///
    /// Returns `None` if no such modifier is active, so a second removal of
    /// the same modifier is a no-op.
    pub fn remove_modifier(&mut self, name: &str) -> Option<StatModifier> {
        let index = self.modifiers.iter().position(|m| m.name == name)?;
        Some(self.modifiers.remove(index))
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m.name == name)
    }

    pub fn modifier(&self, name: &str) -> Option<&StatModifier> {
        self.modifiers.iter().find(|m| m.name == name)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &StatModifier> {
        self.modifiers.iter()
    }

    /// Computes the effective value of `stat` from its base value.
    pub fn effective(&self, stat: Stat, base: f64) -> f64 {
        stats::compose(
            base,
            self.modifiers.iter().filter_map(|m| m.flat_for(stat)),
            self.modifiers.iter().filter_map(|m| m.percent_for(stat)),
        )
    }

    // ========================================================================
    // Periodic effects
    // ========================================================================

    /// Adds a damage-over-time instance.
    ///
    /// Returns `None` when the effect has no turns left and was discarded.
    pub fn add_dot(&mut self, effect: PeriodicEffect) -> Option<EffectNotice> {
        Self::add_periodic(&mut self.dots, effect, EffectCategory::Dot)
    }

    /// Adds a heal-over-time instance, with the same stacking rules as DoTs.
    pub fn add_hot(&mut self, effect: PeriodicEffect) -> Option<EffectNotice> {
        Self::add_periodic(&mut self.hots, effect, EffectCategory::Hot)
    }

    pub fn dots(&self) -> &[PeriodicEffect] {
        &self.dots
    }

    pub fn hots(&self) -> &[PeriodicEffect] {
        &self.hots
    }

    pub fn stacks_of(&self, id: &str) -> usize {
        self.dots
            .iter()
            .chain(self.hots.iter())
            .filter(|e| e.id == id)
            .count()
    }

    fn add_periodic(
        list: &mut Vec<PeriodicEffect>,
        mut effect: PeriodicEffect,
        category: EffectCategory,
    ) -> Option<EffectNotice> {
        if effect.turns == 0 {
            return None;
        }
        if category == EffectCategory::Dot {
            effect.flags |= DamageFlags::DOT;
        }

        let mut kind = NoticeKind::Applied;
        if let Some(cap) = effect.max_stacks {
            let cap = cap.max(1) as usize;
            while list.iter().filter(|e| e.id == effect.id).count() >= cap {
                let Some(oldest) = list.iter().position(|e| e.id == effect.id) else {
                    break;
                };
                list.remove(oldest);
                kind = NoticeKind::Refreshed;
            }
            if kind == NoticeKind::Refreshed {
                for other in list.iter_mut().filter(|e| e.id == effect.id) {
                    other.turns = effect.turns;
                }
            }
        }

        let notice = EffectNotice::new(kind, category, effect.id.clone())
            .with_amount(effect.magnitude)
            .with_remaining(Some(effect.turns));
        list.push(effect);
        Some(notice)
    }

    // ========================================================================
    // Turn boundary
    // ========================================================================

    /// Advances every effect by one turn.
    ///
    /// Fixed order:
    /// 1. DoTs deal damage (no mitigation; shields apply unless cost damage)
    ///    and count down
    /// 2. HoTs heal (never reviving a defeated owner) and count down
    /// 3. Modifier durations count down
    /// 4. Expired effects are removed
    ///
    /// `max_hp` is the owner's effective max HP before the tick. The caller
    /// re-clamps HP afterwards because expiring modifiers may lower it.
    pub fn tick(&mut self, vitals: &mut Vitals, max_hp: i64) -> TickReport {
        let mut report = TickReport::default();

        for dot in &mut self.dots {
            let applied = vitals.absorb(dot.magnitude, dot.flags);
            dot.turns = dot.turns.saturating_sub(1);
            report.damage.push(PeriodicHit {
                effect_id: dot.id.clone(),
                source: dot.source,
                damage_type: dot.damage_type,
                amount: applied.hp_lost,
                absorbed: applied.absorbed,
            });
            report.notices.push(
                EffectNotice::new(NoticeKind::Ticked, EffectCategory::Dot, dot.id.clone())
                    .with_amount(applied.total())
                    .with_remaining(Some(dot.turns)),
            );
        }

        for hot in &mut self.hots {
            let healed = if vitals.hp > 0 {
                vitals.restore(hot.magnitude, max_hp)
            } else {
                0
            };
            hot.turns = hot.turns.saturating_sub(1);
            report.healing.push(PeriodicHit {
                effect_id: hot.id.clone(),
                source: hot.source,
                damage_type: hot.damage_type,
                amount: healed,
                absorbed: 0,
            });
            report.notices.push(
                EffectNotice::new(NoticeKind::Ticked, EffectCategory::Hot, hot.id.clone())
                    .with_amount(healed)
                    .with_remaining(Some(hot.turns)),
            );
        }

        let mut expired_modifiers = Vec::new();
        for modifier in &mut self.modifiers {
            if modifier.duration.tick() {
                expired_modifiers.push(modifier.name.clone());
            }
        }

        Self::drain_expired(&mut self.dots, EffectCategory::Dot, &mut report.notices);
        Self::drain_expired(&mut self.hots, EffectCategory::Hot, &mut report.notices);
        self.modifiers.retain(|m| !expired_modifiers.contains(&m.name));
        report.notices.extend(expired_modifiers.into_iter().map(|name| {
            EffectNotice::new(NoticeKind::Removed, EffectCategory::Modifier, name)
                .with_remaining(Some(0))
        }));

        report
    }

    fn drain_expired(
        list: &mut Vec<PeriodicEffect>,
        category: EffectCategory,
        notices: &mut Vec<EffectNotice>,
    ) {
        list.retain(|effect| {
            if effect.turns == 0 {
                notices.push(
                    EffectNotice::new(NoticeKind::Removed, category, effect.id.clone())
                        .with_remaining(Some(0)),
                );
                false
            } else {
                true
            }
        });
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Removes every modifier and periodic effect whose name matches.
    pub fn cleanse(
        &mut self,
        mut matches: impl FnMut(EffectCategory, &str) -> bool,
    ) -> Vec<EffectNotice> {
        let mut notices = Vec::new();

        self.modifiers.retain(|m| {
            if matches(EffectCategory::Modifier, &m.name) {
                notices.push(EffectNotice::new(
                    NoticeKind::Removed,
                    EffectCategory::Modifier,
                    m.name.clone(),
                ));
                false
            } else {
                true
            }
        });
        for (list, category) in [
            (&mut self.dots, EffectCategory::Dot),
            (&mut self.hots, EffectCategory::Hot),
        ] {
            list.retain(|e| {
                if matches(category, &e.id) {
                    notices.push(EffectNotice::new(NoticeKind::Removed, category, e.id.clone()));
                    false
                } else {
                    true
                }
            });
        }

        notices
    }

    /// Drops everything. Used when a battle ends.
    pub fn clear(&mut self) {
        self.modifiers.clear();
        self.dots.clear();
        self.hots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.dots.is_empty() && self.hots.is_empty()
    }

    /// Summaries grouped by effect name, for progress snapshots.
    pub fn summaries(&self) -> Vec<EffectSummary> {
        let mut summaries: Vec<EffectSummary> = self
            .modifiers
            .iter()
            .map(|m| EffectSummary {
                name: m.name.clone(),
                category: EffectCategory::Modifier,
                stacks: 1,
                remaining: m.duration.remaining(),
            })
            .collect();

        for (list, category) in [
            (&self.dots, EffectCategory::Dot),
            (&self.hots, EffectCategory::Hot),
        ] {
            let mut grouped: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
            for effect in list {
                let entry = grouped.entry(effect.id.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 = entry.1.max(effect.turns);
            }
            summaries.extend(grouped.into_iter().map(|(name, (stacks, remaining))| {
                EffectSummary {
                    name: name.to_string(),
                    category,
                    stacks,
                    remaining: Some(remaining),
                }
            }));
        }

        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atk_buff(name: &str) -> StatModifier {
        StatModifier::new(name).percent(Stat::Atk, 0.05)
    }

    #[test]
    fn same_name_modifier_is_replaced() {
        let mut effects = EffectManager::new();
        let first = effects.add_modifier(atk_buff("relic_atk").turns(2));
        let second = effects.add_modifier(atk_buff("relic_atk").turns(5));

        assert_eq!(first.kind, NoticeKind::Applied);
        assert_eq!(second.kind, NoticeKind::Refreshed);
        assert_eq!(effects.modifiers().count(), 1);
        assert!((effects.effective(Stat::Atk, 100.0) - 105.0).abs() < 1e-9);
    }

    #[test]
    fn independent_percent_modifiers_compound() {
        let mut effects = EffectManager::new();
        for i in 0..4 {
            effects.add_modifier(atk_buff(&format!("atk_{i}")));
        }
        let expected = 100.0 * 1.05_f64.powi(4);
        assert!((effects.effective(Stat::Atk, 100.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn flat_deltas_sum_before_multipliers() {
        let mut effects = EffectManager::new();
        effects.add_modifier(StatModifier::new("a").flat(Stat::Defense, 10.0));
        effects.add_modifier(StatModifier::new("b").flat(Stat::Defense, 10.0));
        effects.add_modifier(StatModifier::new("c").percent(Stat::Defense, 1.0));
        // (50 + 20) × 2
        assert_eq!(effects.effective(Stat::Defense, 50.0), 140.0);
    }

    #[test]
    fn removal_is_symmetric() {
        let mut effects = EffectManager::new();
        effects.add_modifier(atk_buff("once"));
        assert!(effects.remove_modifier("once").is_some());
        assert!(effects.remove_modifier("once").is_none());
        assert_eq!(effects.effective(Stat::Atk, 100.0), 100.0);
    }

    #[test]
    fn dot_ticks_then_removes_itself() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals::new(100);
        effects.add_dot(PeriodicEffect::new("poison", 10, 2));

        let first = effects.tick(&mut vitals, 100);
        assert_eq!(vitals.hp, 90);
        assert_eq!(first.total_damage(), 10);
        assert_eq!(effects.dots().len(), 1);

        let second = effects.tick(&mut vitals, 100);
        assert_eq!(vitals.hp, 80);
        assert!(effects.dots().is_empty());
        assert!(
            second
                .notices
                .iter()
                .any(|n| n.kind == NoticeKind::Removed && n.name == "poison")
        );
    }

    #[test]
    fn dot_with_three_turns_ticks_exactly_three_times() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals::new(1000);
        effects.add_dot(PeriodicEffect::new("burn", 5, 3));

        let mut ticks = 0;
        for _ in 0..6 {
            ticks += effects.tick(&mut vitals, 1000).damage.len();
        }
        assert_eq!(ticks, 3);
        assert_eq!(vitals.hp, 985);
    }

    #[test]
    fn capped_dot_replaces_oldest_and_refreshes_rest() {
        let mut effects = EffectManager::new();
        effects.add_dot(PeriodicEffect::new("bleed", 1, 2).max_stacks(2));
        effects.add_dot(PeriodicEffect::new("bleed", 2, 3).max_stacks(2));
        let notice = effects
            .add_dot(PeriodicEffect::new("bleed", 3, 5).max_stacks(2))
            .unwrap();

        assert_eq!(notice.kind, NoticeKind::Refreshed);
        assert_eq!(effects.stacks_of("bleed"), 2);
        let magnitudes: Vec<i64> = effects.dots().iter().map(|d| d.magnitude).collect();
        assert_eq!(magnitudes, vec![2, 3]);
        assert!(effects.dots().iter().all(|d| d.turns == 5));
    }

    #[test]
    fn stacks_never_exceed_cap() {
        let mut effects = EffectManager::new();
        for i in 0..20 {
            effects.add_dot(PeriodicEffect::new("shock", i, 3).max_stacks(4));
            assert!(effects.stacks_of("shock") <= 4);
        }
    }

    #[test]
    fn dot_respects_shields_unless_cost() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals { hp: 100, shields: 15 };
        effects.add_dot(PeriodicEffect::new("poison", 10, 1));
        effects.add_dot(PeriodicEffect::new("price", 10, 1).cost_damage());

        let report = effects.tick(&mut vitals, 100);
        assert_eq!(report.damage[0].absorbed, 10);
        assert_eq!(report.damage[1].absorbed, 0);
        assert_eq!(vitals, Vitals { hp: 90, shields: 5 });
    }

    #[test]
    fn hot_heals_after_dots_and_caps() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals::new(95);
        effects.add_dot(PeriodicEffect::new("poison", 10, 1));
        effects.add_hot(PeriodicEffect::new("regen", 20, 1));

        let report = effects.tick(&mut vitals, 100);
        assert_eq!(report.total_healing(), 15);
        assert_eq!(vitals.hp, 100);
    }

    #[test]
    fn hot_does_not_revive() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals::new(0);
        effects.add_hot(PeriodicEffect::new("regen", 20, 2));
        effects.tick(&mut vitals, 100);
        assert_eq!(vitals.hp, 0);
    }

    #[test]
    fn modifier_durations_expire() {
        let mut effects = EffectManager::new();
        let mut vitals = Vitals::new(100);
        effects.add_modifier(atk_buff("short").turns(1));
        effects.add_modifier(atk_buff("forever"));

        let report = effects.tick(&mut vitals, 100);
        assert!(!effects.has_modifier("short"));
        assert!(effects.has_modifier("forever"));
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].category, EffectCategory::Modifier);
    }

    #[test]
    fn zero_turn_effects_are_discarded() {
        let mut effects = EffectManager::new();
        assert!(effects.add_dot(PeriodicEffect::new("noop", 10, 0)).is_none());
        assert!(effects.dots().is_empty());
    }

    #[test]
    fn cleanse_removes_matching_effects() {
        let mut effects = EffectManager::new();
        effects.add_modifier(atk_buff("enrage"));
        effects.add_dot(PeriodicEffect::new("poison", 5, 3));
        effects.add_hot(PeriodicEffect::new("regen", 5, 3));

        let notices = effects.cleanse(|category, _| category == EffectCategory::Dot);
        assert_eq!(notices.len(), 1);
        assert!(effects.dots().is_empty());
        assert_eq!(effects.hots().len(), 1);
        assert!(effects.has_modifier("enrage"));
    }

    #[test]
    fn summaries_group_stacks() {
        let mut effects = EffectManager::new();
        effects.add_dot(PeriodicEffect::new("bleed", 1, 2));
        effects.add_dot(PeriodicEffect::new("bleed", 1, 4));

        let summaries = effects.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].stacks, 2);
        assert_eq!(summaries[0].remaining, Some(4));
    }
}
