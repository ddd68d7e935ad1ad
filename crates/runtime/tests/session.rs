mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use battle_core::{
    BattleConfig, Combatant, CombatantId, EnrageConfig, Side, Stat, StatModifier,
};
use battle_runtime::{
    ActionProvider, ActionRequest, AutoActionProvider, BattleError, BattleEvent, BattleResult,
    BattleSession, BattleSnapshot, BattleState, EventHandler, EventKind, HandlerContext,
    HandlerCriticality, HandlerError, Lifesteal, Momentum, Outcome, Party, RewardHook,
    RuntimeConfig,
};
use tokio::sync::mpsc;

use common::{fighter, hero, slime};

const HERO: CombatantId = CombatantId(1);

type Recorded = Arc<Mutex<Vec<BattleEvent>>>;

/// Records every event of the given kinds into a shared log.
fn record(session: &mut BattleSession, kinds: &[EventKind]) -> Recorded {
    let log: Recorded = Arc::default();
    for &kind in kinds {
        let sink = Arc::clone(&log);
        session.subscribe_fn(kind, "recorder", HandlerCriticality::Optional, move |event, _| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    log
}

fn tank(id: u32, side: Side) -> Combatant {
    fighter(id, side, 1_000_000.0, 1.0, 100.0)
}

#[tokio::test]
async fn party_wins_against_weak_foe() {
    let session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .build()
        .unwrap();

    let result = session.run().await.unwrap();

    assert_eq!(result.outcome, Outcome::Victory);
    assert!(result.is_victory());
    assert_eq!(result.defeated_foes, vec![CombatantId(10)]);
    assert!(result.turns >= 3);
    assert!(result.party.members[0].hp() > 0);
}

#[tokio::test]
async fn party_loses_against_strong_foe() {
    let party = Party::new(vec![fighter(1, Side::Party, 100.0, 1.0, 100.0)]);
    let foes = vec![fighter(10, Side::Foe, 1_000.0, 60.0, 120.0)];

    let result = BattleSession::builder(party, foes)
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Defeat);
    assert!(result.party.is_wiped());
    assert!(result.defeated_foes.is_empty());
}

#[tokio::test]
async fn builder_rejects_bad_rosters() {
    let empty = BattleSession::builder(Party::new(vec![hero(1)]), Vec::new()).build();
    assert!(matches!(empty, Err(BattleError::NoCombatants)));

    let duplicate = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(1)]).build();
    assert!(matches!(
        duplicate,
        Err(BattleError::DuplicateCombatant(CombatantId(1)))
    ));
}

#[tokio::test]
async fn equal_seeds_replay_equal_battles() {
    async fn play(seed: u64) -> (BattleResult, Vec<BattleEvent>) {
        let mut lucky = hero(1);
        lucky.set_base(Stat::CritRate, 0.5).unwrap();
        lucky.set_base(Stat::Dodge, 0.3).unwrap();
        let mut foe = fighter(10, Side::Foe, 2_000.0, 40.0, 110.0);
        foe.set_base(Stat::CritRate, 0.5).unwrap();

        let mut session = BattleSession::builder(Party::new(vec![lucky]), vec![foe, slime(11)])
            .seed(seed)
            .build()
            .unwrap();
        let log = record(&mut session, &[EventKind::DamageDealt, EventKind::TurnStart]);
        let result = session.run().await.unwrap();
        let events = log.lock().unwrap().clone();
        (result, events)
    }

    let (first, first_events) = play(42).await;
    let (second, second_events) = play(42).await;

    assert_eq!(first, second);
    assert_eq!(first_events, second_events);
    assert!(!first_events.is_empty());
}

/// Handler that never finishes in time.
struct Stall;

#[async_trait]
impl EventHandler for Stall {
    fn name(&self) -> &str {
        "stall"
    }

    async fn handle(
        &self,
        _event: &BattleEvent,
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(())
    }
}

#[tokio::test]
async fn stalled_turn_times_out_with_recent_events() {
    let config = RuntimeConfig::default().with_turn_timeout(Duration::from_millis(50));
    let mut session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .config(config)
        .build()
        .unwrap();
    session.subscribe(EventKind::TurnStart, Arc::new(Stall));

    let err = session.run().await.unwrap_err();

    let (actor, turn, timeout, recent_events) = match err {
        BattleError::TurnTimeout {
            actor,
            turn,
            timeout,
            recent_events,
        } => (actor, turn, timeout, recent_events),
        other => panic!("expected timeout, got {other:?}"),
    };
    assert_eq!(turn, 1);
    assert_eq!(actor, Some(HERO));
    assert_eq!(timeout, Duration::from_millis(50));
    assert!(
        recent_events
            .iter()
            .any(|event| event.kind() == EventKind::TurnStart)
    );
}

fn expect_timeout(err: BattleError) -> (Option<CombatantId>, u32, Vec<BattleEvent>) {
    match err {
        BattleError::TurnTimeout {
            actor,
            turn,
            recent_events,
            ..
        } => (actor, turn, recent_events),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn stalled_battle_start_times_out() {
    let config = RuntimeConfig::default().with_turn_timeout(Duration::from_millis(50));
    let mut session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .config(config)
        .build()
        .unwrap();
    session.subscribe(EventKind::BattleStart, Arc::new(Stall));

    let (actor, turn, recent_events) = expect_timeout(session.run().await.unwrap_err());

    assert_eq!(actor, None);
    assert_eq!(turn, 0);
    assert_eq!(recent_events[0].kind(), EventKind::BattleStart);
}

#[tokio::test]
async fn stalled_battle_end_times_out() {
    let config = RuntimeConfig::default().with_turn_timeout(Duration::from_millis(50));
    let mut session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .config(config)
        .build()
        .unwrap();
    session.subscribe(EventKind::BattleEnd, Arc::new(Stall));
    let bus = session.bus().clone();

    let (actor, turn, recent_events) = expect_timeout(session.run().await.unwrap_err());

    assert_eq!(actor, None);
    assert!(turn >= 3);
    assert_eq!(
        recent_events.last().map(BattleEvent::kind),
        Some(EventKind::BattleEnd)
    );
    assert_eq!(bus.total_subscribers(), 0);
}

#[tokio::test]
async fn panicking_plugin_does_not_abort_battle() {
    let mut session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .build()
        .unwrap();
    // Splits each hit among the other foes; there are none.
    session.subscribe_fn(
        EventKind::HitLanded,
        "splash",
        HandlerCriticality::Important,
        |event, ctx| {
            if let BattleEvent::HitLanded { amount, .. } = event {
                let others = ctx.state.roster.living_ids(Side::Foe).len().saturating_sub(1);
                let _share = *amount as usize / others;
            }
            Ok(())
        },
    );

    let result = session.spawn().join().await.unwrap();

    assert!(result.is_victory());
    assert_eq!(result.defeated_foes, vec![CombatantId(10)]);
}

#[tokio::test]
async fn freezing_a_foe_mid_battle_keeps_it_queued() {
    const FOE: CombatantId = CombatantId(10);
    let mut session = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .build()
        .unwrap();
    session.subscribe_fn(
        EventKind::TurnStart,
        "freeze",
        HandlerCriticality::Critical,
        |event, ctx| {
            if let BattleEvent::TurnStart { actor: HERO, .. } = event {
                let freeze = StatModifier::new("freeze").percent(Stat::Spd, -1.0);
                ctx.state.apply_modifier(FOE, freeze, &mut Vec::new())?;
            }
            Ok(())
        },
    );
    let log = record(&mut session, &[EventKind::TurnStart]);

    let result = session.run().await.unwrap();

    assert!(result.is_victory());
    let foe_turns = log
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, BattleEvent::TurnStart { actor: FOE, .. }))
        .count();
    assert!(foe_turns <= 1);
}

#[derive(Default)]
struct Ledger {
    defeated: Mutex<Vec<CombatantId>>,
    finished: Mutex<u32>,
}

impl RewardHook for Ledger {
    fn foe_defeated(&self, foe: &Combatant) {
        self.defeated.lock().unwrap().push(foe.id);
    }

    fn battle_finished(&self, _result: &BattleResult) {
        *self.finished.lock().unwrap() += 1;
    }
}

#[tokio::test]
async fn each_defeated_foe_is_credited_once() {
    let ledger = Arc::new(Ledger::default());
    let result = BattleSession::builder(
        Party::new(vec![hero(1), hero(2)]),
        vec![slime(10), slime(11)],
    )
    .rewards(ledger.clone())
    .build()
    .unwrap()
    .run()
    .await
    .unwrap();

    assert!(result.is_victory());
    let mut credited = ledger.defeated.lock().unwrap().clone();
    credited.sort();
    assert_eq!(credited, vec![CombatantId(10), CombatantId(11)]);
    assert_eq!(result.defeated_foes.len(), 2);
    assert_eq!(*ledger.finished.lock().unwrap(), 1);
}

#[tokio::test]
async fn plugin_subscriptions_released_after_battle() {
    let party = Party::new(vec![hero(1)])
        .with_relic(Lifesteal::ID)
        .with_card(Momentum::ID)
        .with_relic("no_such_relic");
    let session = BattleSession::builder(party, vec![slime(10)])
        .build()
        .unwrap();
    let bus = session.bus().clone();

    assert_eq!(session.plugin_ids(), vec![Lifesteal::ID, Momentum::ID]);
    assert_eq!(bus.total_subscribers(), 2);

    let result = session.run().await.unwrap();

    assert!(result.is_victory());
    assert_eq!(bus.total_subscribers(), 0);
    assert_eq!(result.party.relics, vec![Lifesteal::ID, "no_such_relic"]);
}

/// Auto-battle policy that thinks for a while before every action.
struct Slow;

#[async_trait]
impl ActionProvider for Slow {
    async fn provide_action(
        &self,
        actor: CombatantId,
        state: &BattleState,
    ) -> battle_runtime::Result<ActionRequest> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(AutoActionProvider::choose(actor, state))
    }
}

#[tokio::test]
async fn cancelled_battle_releases_subscriptions() {
    let party = Party::new(vec![tank(1, Side::Party)]).with_relic(Lifesteal::ID);
    let session = BattleSession::builder(party, vec![tank(10, Side::Foe)])
        .party_provider(Slow)
        .foe_provider(Slow)
        .build()
        .unwrap();
    let bus = session.bus().clone();
    assert_eq!(bus.total_subscribers(), 1);

    let handle = session.spawn();
    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.cancel();

    let err = handle.join().await.unwrap_err();
    assert!(matches!(err, BattleError::Cancelled));
    assert_eq!(bus.total_subscribers(), 0);
}

#[tokio::test]
async fn momentum_grants_bonus_turns() {
    let party = Party::new(vec![fighter(1, Side::Party, 1_000.0, 10.0, 100.0)])
        .with_card(Momentum::ID);
    let foes = vec![fighter(10, Side::Foe, 400.0, 1.0, 100.0)];
    let mut session = BattleSession::builder(party, foes).build().unwrap();
    let log = record(&mut session, &[EventKind::TurnStart, EventKind::CardEffect]);

    let result = session.run().await.unwrap();
    assert!(result.is_victory());

    let events = log.lock().unwrap();
    assert!(events.iter().any(|event| matches!(
        event,
        BattleEvent::TurnStart { actor: HERO, bonus: true, .. }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        BattleEvent::CardEffect { id, entity: HERO, .. } if id == Momentum::ID
    )));
}

#[tokio::test]
async fn lifesteal_heals_the_attacker() {
    let party = Party::new(vec![hero(1).with_hp(500)]).with_relic(Lifesteal::ID);
    let mut session = BattleSession::builder(party, vec![slime(10)])
        .build()
        .unwrap();
    let log = record(&mut session, &[EventKind::RelicEffect]);

    let result = session.run().await.unwrap();

    assert!(result.is_victory());
    assert!(!log.lock().unwrap().is_empty());
    assert!(result.party.members[0].hp() > 500 - 10 * i64::from(result.turns));
}

fn enrage_config(enrage: EnrageConfig) -> RuntimeConfig {
    RuntimeConfig::default().with_battle(BattleConfig::default().with_enrage(enrage))
}

#[tokio::test]
async fn turn_limit_ends_in_defeat() {
    let config = enrage_config(EnrageConfig {
        max_turns: 5,
        ..EnrageConfig::default()
    });
    let result = BattleSession::builder(
        Party::new(vec![tank(1, Side::Party)]),
        vec![tank(10, Side::Foe)],
    )
    .config(config)
    .build()
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(result.outcome, Outcome::Defeat);
    assert_eq!(result.turns, 5);
    assert_eq!(result.enrage.turn, 5);
    assert!(result.party.members[0].is_alive());
}

#[tokio::test]
async fn enrage_buffs_foes_and_bleeds_party() {
    let config = enrage_config(EnrageConfig {
        base_threshold: 2,
        per_foe_threshold: 0,
        max_threshold: 2,
        atk_per_stack: 0.5,
        bleed_after_stacks: 1,
        bleed_interval: 1,
        bleed_fraction: 0.01,
        bleed_turns: 2,
        bleed_max_stacks: 3,
        max_turns: 12,
    });
    let mut session = BattleSession::builder(
        Party::new(vec![tank(1, Side::Party)]),
        vec![tank(10, Side::Foe)],
    )
    .config(config)
    .build()
    .unwrap();
    let log = record(&mut session, &[EventKind::EffectApplied]);

    let result = session.run().await.unwrap();

    assert_eq!(result.outcome, Outcome::Defeat);
    assert!(result.enrage.active);
    assert_eq!(result.enrage.stacks, 10);
    let applied: Vec<(String, CombatantId)> = log
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::EffectApplied {
                effect_name,
                entity,
                ..
            } => Some((effect_name.clone(), *entity)),
            _ => None,
        })
        .collect();
    assert!(applied.contains(&("enrage".to_string(), CombatantId(10))));
    assert!(applied.contains(&("enrage_bleed".to_string(), HERO)));
    let bleed_ticked = log.lock().unwrap().iter().any(|event| match event {
        BattleEvent::EffectApplied {
            effect_name,
            details,
            ..
        } => {
            effect_name == "enrage_bleed"
                && details.get("ticked").and_then(|v| v.as_bool()) == Some(true)
                && details.get("amount").and_then(|v| v.as_i64()).is_some_and(|a| a > 0)
        }
        _ => false,
    });
    assert!(bleed_ticked);
    // Battle-scoped effects do not leak out of the battle.
    assert!(result.party.members[0].effects().is_empty());
}

#[tokio::test]
async fn progress_snapshots_follow_the_battle() {
    let (tx, mut rx) = mpsc::unbounded_channel::<BattleSnapshot>();
    let result = BattleSession::builder(Party::new(vec![hero(1)]), vec![slime(10)])
        .progress(tx)
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut snapshots = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        snapshots.push(snapshot);
    }
    let first = snapshots.first().unwrap();
    let last = snapshots.last().unwrap();
    assert_eq!(first.turn, 0);
    assert_eq!(first.combatants.len(), 2);
    assert_eq!(last.turn, result.turns);
    assert!(
        last.combatants
            .iter()
            .any(|c| c.id == CombatantId(10) && c.hp == 0)
    );
}
