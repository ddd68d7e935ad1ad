//! Demo party and foe templates.
use battle_core::{BaseStats, Combatant, CombatantId, Side, Stat};
use battle_runtime::Party;

use crate::config::SimConfig;

const FOE_ID_BASE: u32 = 100;

fn member(id: u32, name: &str, stats: BaseStats) -> Combatant {
    Combatant::new(CombatantId(id), name, Side::Party, stats)
}

pub fn party(config: &SimConfig) -> Party {
    let members = vec![
        member(
            1,
            "Knight",
            BaseStats::new()
                .with(Stat::MaxHp, 1_400.0)
                .with(Stat::Atk, 90.0)
                .with(Stat::Defense, 120.0)
                .with(Stat::Spd, 95.0),
        ),
        member(
            2,
            "Ranger",
            BaseStats::new()
                .with(Stat::MaxHp, 850.0)
                .with(Stat::Atk, 140.0)
                .with(Stat::Spd, 125.0)
                .with(Stat::CritRate, 0.25)
                .with(Stat::Dodge, 0.1),
        ),
        member(
            3,
            "Cleric",
            BaseStats::new()
                .with(Stat::MaxHp, 950.0)
                .with(Stat::Atk, 70.0)
                .with(Stat::Spd, 110.0)
                .with(Stat::Vitality, 1.25),
        ),
    ];

    let mut party = Party::new(members);
    party.relics = config.relics.clone();
    party.cards = config.cards.clone();
    party
}

/// `count` foes of growing strength; the last one is a boss.
pub fn foes(count: usize) -> Vec<Combatant> {
    let count = count.max(1);
    (0..count)
        .map(|index| {
            let boss = index + 1 == count && count > 1;
            let tier = index as f64;
            let id = CombatantId(FOE_ID_BASE + index as u32);
            let name = if boss {
                "Ghoul Lord".to_string()
            } else {
                format!("Ghoul {}", index + 1)
            };
            let scale = if boss { 2.5 } else { 1.0 + tier * 0.1 };

            Combatant::new(
                id,
                name,
                Side::Foe,
                BaseStats::new()
                    .with(Stat::MaxHp, 900.0 * scale)
                    .with(Stat::Atk, 80.0 * scale)
                    .with(Stat::Defense, 40.0)
                    .with(Stat::Spd, 90.0 + tier * 5.0),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foes_get_unique_ids_and_a_boss() {
        let foes = foes(3);
        assert_eq!(foes.len(), 3);
        assert_eq!(foes[2].name, "Ghoul Lord");
        assert!(foes[2].max_hp() > foes[0].max_hp());

        let mut ids: Vec<_> = foes.iter().map(|f| f.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn single_foe_is_not_a_boss() {
        let foes = foes(0);
        assert_eq!(foes.len(), 1);
        assert_eq!(foes[0].name, "Ghoul 1");
    }

    #[test]
    fn party_carries_configured_plugins() {
        let party = party(&SimConfig::default());
        assert_eq!(party.members.len(), 3);
        assert!(party.members.iter().all(|m| m.side == Side::Party));
        assert_eq!(party.relics, vec!["lifesteal"]);
        assert_eq!(party.cards, vec!["momentum"]);
    }
}
