//! Direct-hit damage formula.
//!
//! ```text
//! raw      = effective(Atk) × multiplier
//! crit     = raw × effective(CritDamage)            (chance: CritRate)
//! defended = crit × scale / (scale + effective(Defense))
//! final    = defended / max(Mitigation × Vitality, MIN_DIVISOR)
//! ```
//!
//! Dodge is rolled first; a dodged hit deals nothing. Landed hits deal at
//! least one point.

use super::types::DamageFlags;
use crate::config::BattleConfig;
use crate::rng::BattleRng;
use crate::state::Combatant;
use crate::stats::Stat;

/// Outcome of rolling one attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageRoll {
    pub amount: i64,
    pub flags: DamageFlags,
    pub dodged: bool,
}

impl DamageRoll {
    pub fn is_crit(&self) -> bool {
        self.flags.contains(DamageFlags::CRIT)
    }
}

/// Rolls dodge and crit and computes final damage for a direct hit.
pub fn roll_attack(
    attacker: &Combatant,
    target: &Combatant,
    multiplier: f64,
    config: &BattleConfig,
    rng: &mut BattleRng,
) -> DamageRoll {
    if rng.chance(target.effective(Stat::Dodge)) {
        return DamageRoll {
            amount: 0,
            flags: DamageFlags::empty(),
            dodged: true,
        };
    }

    let mut flags = DamageFlags::empty();
    let mut raw = attacker.effective(Stat::Atk) * multiplier.max(0.0);
    if rng.chance(attacker.effective(Stat::CritRate)) {
        raw *= attacker.effective(Stat::CritDamage);
        flags |= DamageFlags::CRIT;
    }

    DamageRoll {
        amount: mitigate(raw, target, flags, config),
        flags,
        dodged: false,
    }
}

/// Applies the target's defense and mitigation to raw damage.
///
/// DoT and true damage skip both steps.
pub fn mitigate(raw: f64, target: &Combatant, flags: DamageFlags, config: &BattleConfig) -> i64 {
    if raw <= 0.0 {
        return 0;
    }
    if flags.intersects(DamageFlags::DOT | DamageFlags::TRUE_DAMAGE) {
        return raw.round().max(1.0) as i64;
    }

    let defense = target.effective(Stat::Defense);
    let defended = raw * config.defense_scale / (config.defense_scale + defense);
    let divisor = (target.effective(Stat::Mitigation) * target.effective(Stat::Vitality))
        .max(BattleConfig::MIN_DAMAGE_DIVISOR);

    (defended / divisor).round().max(1.0) as i64
}

/// Scales healing by the receiver's vitality.
pub fn heal_amount(raw: f64, target: &Combatant) -> i64 {
    (raw * target.effective(Stat::Vitality)).round().max(0.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CombatantId, Side};
    use crate::stats::BaseStats;

    fn fighter(id: u32, stats: BaseStats) -> Combatant {
        Combatant::new(CombatantId(id), format!("fighter-{id}"), Side::Party, stats)
    }

    #[test]
    fn defense_scales_damage() {
        let config = BattleConfig::default();
        let target = fighter(1, BaseStats::new().with(Stat::Defense, 200.0));
        // 100 × 200 / 400 = 50
        assert_eq!(mitigate(100.0, &target, DamageFlags::empty(), &config), 50);
    }

    #[test]
    fn dot_damage_skips_mitigation() {
        let config = BattleConfig::default();
        let target = fighter(1, BaseStats::new().with(Stat::Defense, 10_000.0));
        assert_eq!(mitigate(40.0, &target, DamageFlags::DOT, &config), 40);
    }

    #[test]
    fn guaranteed_crit_and_no_dodge() {
        let config = BattleConfig::default();
        let attacker = fighter(
            1,
            BaseStats::new()
                .with(Stat::CritRate, 1.0)
                .with(Stat::CritDamage, 2.0),
        );
        let target = fighter(2, BaseStats::new().with(Stat::Defense, 0.0));
        let mut rng = BattleRng::from_seed(1);

        let roll = roll_attack(&attacker, &target, 1.0, &config, &mut rng);
        assert!(roll.is_crit());
        assert_eq!(roll.amount, 200);
    }

    #[test]
    fn full_dodge_deals_nothing() {
        let config = BattleConfig::default();
        let attacker = fighter(1, BaseStats::new());
        let target = fighter(2, BaseStats::new().with(Stat::Dodge, 1.0));
        let mut rng = BattleRng::from_seed(9);

        let roll = roll_attack(&attacker, &target, 1.0, &config, &mut rng);
        assert!(roll.dodged);
        assert_eq!(roll.amount, 0);
    }
}
