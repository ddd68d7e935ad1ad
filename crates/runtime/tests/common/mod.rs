#![allow(dead_code)]

use battle_core::{BaseStats, BattleConfig, BattleRng, Combatant, CombatantId, Roster, Side, Stat};
use battle_runtime::BattleState;

/// Combatant with no crits, dodges or defense, so every hit lands for
/// exactly `atk × multiplier`.
pub fn fighter(id: u32, side: Side, hp: f64, atk: f64, spd: f64) -> Combatant {
    Combatant::new(
        CombatantId(id),
        format!("{side}-{id}"),
        side,
        BaseStats::new()
            .with(Stat::MaxHp, hp)
            .with(Stat::Atk, atk)
            .with(Stat::Spd, spd)
            .with(Stat::Defense, 0.0)
            .with(Stat::CritRate, 0.0)
            .with(Stat::Dodge, 0.0),
    )
}

pub fn hero(id: u32) -> Combatant {
    fighter(id, Side::Party, 1_000.0, 100.0, 120.0)
}

pub fn slime(id: u32) -> Combatant {
    fighter(id, Side::Foe, 300.0, 10.0, 100.0)
}

pub fn state(combatants: impl IntoIterator<Item = Combatant>) -> BattleState {
    let roster: Roster = combatants.into_iter().collect();
    BattleState::new(roster, BattleConfig::default(), BattleRng::from_seed(7))
        .expect("valid roster")
}
