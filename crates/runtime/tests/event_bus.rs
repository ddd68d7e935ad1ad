mod common;

use std::sync::{Arc, Mutex};

use battle_core::{CombatantId, DamageFlags, DamageType, Side};
use battle_runtime::{
    BatchConfig, BattleError, BattleEvent, EventBus, EventKind, HandlerCriticality, HandlerError,
};

use common::{fighter, state};

fn turn_start() -> BattleEvent {
    BattleEvent::TurnStart {
        actor: CombatantId(1),
        turn: 1,
        bonus: false,
    }
}

fn turn_end() -> BattleEvent {
    BattleEvent::TurnEnd {
        actor: CombatantId(1),
        turn: 1,
    }
}

fn battle() -> battle_runtime::BattleState {
    state([
        fighter(1, Side::Party, 100.0, 10.0, 100.0),
        fighter(2, Side::Foe, 100.0, 10.0, 100.0),
    ])
}

#[tokio::test]
async fn emit_without_subscribers_only_records() {
    let bus = EventBus::new();
    let mut state = battle();

    bus.emit(turn_start(), &mut state).await.unwrap();

    assert_eq!(bus.total_subscribers(), 0);
    assert_eq!(bus.recent_events(), vec![turn_start()]);
}

#[tokio::test]
async fn handlers_run_in_subscription_order() {
    let bus = EventBus::new();
    let mut state = battle();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut subs = Vec::new();
    for name in ["first", "second", "third"] {
        let seen = Arc::clone(&seen);
        subs.push(bus.subscribe_fn(
            EventKind::TurnStart,
            name,
            HandlerCriticality::Important,
            move |_, _| {
                seen.lock().unwrap().push(name);
                Ok(())
            },
        ));
    }

    bus.emit(turn_start(), &mut state).await.unwrap();
    bus.emit(turn_end(), &mut state).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    assert_eq!(bus.subscriber_count(EventKind::TurnStart), 3);
}

#[tokio::test]
async fn dropping_subscription_unsubscribes() {
    let bus = EventBus::new();
    let mut state = battle();
    let calls = Arc::new(Mutex::new(0u32));

    let counter = Arc::clone(&calls);
    let sub = bus.subscribe_fn(
        EventKind::TurnStart,
        "counter",
        HandlerCriticality::Important,
        move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        },
    );
    bus.emit(turn_start(), &mut state).await.unwrap();
    drop(sub);
    bus.emit(turn_start(), &mut state).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(bus.subscriber_count(EventKind::TurnStart), 0);
}

#[tokio::test]
async fn unsubscribe_by_id_is_idempotent() {
    let bus = EventBus::new();
    let sub = bus.subscribe_fn(EventKind::TurnEnd, "noop", HandlerCriticality::Optional, |_, _| {
        Ok(())
    });

    assert!(bus.unsubscribe(sub.kind(), sub.id()));
    assert!(!bus.unsubscribe(sub.kind(), sub.id()));
    drop(sub);
    assert_eq!(bus.total_subscribers(), 0);
}

#[tokio::test]
async fn important_failure_does_not_stop_later_handlers() {
    let bus = EventBus::new();
    let mut state = battle();
    let reached = Arc::new(Mutex::new(false));

    let _failing = bus.subscribe_fn(
        EventKind::TurnStart,
        "failing",
        HandlerCriticality::Important,
        |_, _| Err(HandlerError::failed("boom")),
    );
    let flag = Arc::clone(&reached);
    let _after = bus.subscribe_fn(
        EventKind::TurnStart,
        "after",
        HandlerCriticality::Important,
        move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(())
        },
    );

    bus.emit(turn_start(), &mut state).await.unwrap();
    assert!(*reached.lock().unwrap());
}

#[tokio::test]
async fn critical_failure_aborts_dispatch() {
    let bus = EventBus::new();
    let mut state = battle();
    let reached = Arc::new(Mutex::new(false));

    let _failing = bus.subscribe_fn(
        EventKind::TurnStart,
        "ledger",
        HandlerCriticality::Critical,
        |_, _| Err(HandlerError::failed("ledger out of sync")),
    );
    let flag = Arc::clone(&reached);
    let _after = bus.subscribe_fn(
        EventKind::TurnStart,
        "after",
        HandlerCriticality::Important,
        move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(())
        },
    );

    let err = bus.emit(turn_start(), &mut state).await.unwrap_err();
    assert!(matches!(
        err,
        BattleError::Handler { ref handler, event: EventKind::TurnStart, .. } if handler == "ledger"
    ));
    assert!(!*reached.lock().unwrap());
}

#[tokio::test]
async fn panicking_handler_is_isolated_unless_critical() {
    let bus = EventBus::new();
    let mut state = battle();
    let reached = Arc::new(Mutex::new(0u32));

    let _panicking = bus.subscribe_fn(
        EventKind::TurnStart,
        "bad-math",
        HandlerCriticality::Important,
        |_, _| panic!("attempt to divide by zero"),
    );
    let flag = Arc::clone(&reached);
    let _after = bus.subscribe_fn(
        EventKind::TurnStart,
        "after",
        HandlerCriticality::Important,
        move |_, _| {
            *flag.lock().unwrap() += 1;
            Ok(())
        },
    );

    bus.emit(turn_start(), &mut state).await.unwrap();
    assert_eq!(*reached.lock().unwrap(), 1);

    let _critical = bus.subscribe_fn(
        EventKind::TurnEnd,
        "ledger",
        HandlerCriticality::Critical,
        |_, _| panic!("ledger overflow"),
    );
    let err = bus.emit(turn_end(), &mut state).await.unwrap_err();
    assert!(matches!(
        err,
        BattleError::Handler {
            source: HandlerError::Panicked(ref message),
            ..
        } if message == "ledger overflow"
    ));
}

#[tokio::test]
async fn handlers_mutate_state_and_batch_follow_ups() {
    let bus = EventBus::new();
    let mut state = battle();
    let ends = Arc::new(Mutex::new(0u32));

    let _damage = bus.subscribe_fn(
        EventKind::TurnStart,
        "thorns",
        HandlerCriticality::Important,
        |_, ctx| {
            let mut out = Vec::new();
            ctx.state.deal_damage(
                None,
                CombatantId(2),
                25.0,
                DamageType::Generic,
                DamageFlags::empty(),
                "thorns",
                &mut out,
            );
            ctx.emit_all_batched(out);
            ctx.emit_batched(turn_end());
            Ok(())
        },
    );
    let counter = Arc::clone(&ends);
    let _ends = bus.subscribe_fn(
        EventKind::TurnEnd,
        "ends",
        HandlerCriticality::Important,
        move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        },
    );

    bus.emit(turn_start(), &mut state).await.unwrap();
    assert_eq!(state.roster.get(CombatantId(2)).unwrap().hp(), 75);
    assert_eq!(*ends.lock().unwrap(), 0);
    assert_eq!(bus.pending_batched(), 3);

    let delivered = bus.flush_batched(&mut state, &BatchConfig::default()).await.unwrap();
    assert_eq!(delivered, 3);
    assert_eq!(*ends.lock().unwrap(), 1);
    assert_eq!(bus.pending_batched(), 0);
}

#[tokio::test]
async fn self_feeding_handler_trips_storm_limit() {
    let bus = EventBus::new();
    let mut state = battle();
    let _echo = bus.subscribe_fn(
        EventKind::TurnEnd,
        "echo",
        HandlerCriticality::Important,
        |event, ctx| {
            ctx.emit_batched(event.clone());
            Ok(())
        },
    );

    bus.emit_batched(turn_end());
    let config = BatchConfig {
        max_passes: 4,
        ..BatchConfig::default()
    };
    let err = bus.flush_batched(&mut state, &config).await.unwrap_err();

    assert!(matches!(err, BattleError::EventStorm { passes: 4, pending: 1 }));
    assert_eq!(bus.pending_batched(), 1);
}

#[tokio::test]
async fn event_log_keeps_only_the_newest() {
    let bus = EventBus::with_log_capacity(2);
    let mut state = battle();

    for turn in 1..=5 {
        bus.emit(
            BattleEvent::TurnEnd {
                actor: CombatantId(1),
                turn,
            },
            &mut state,
        )
        .await
        .unwrap();
    }

    let turns: Vec<u32> = bus
        .recent_events()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::TurnEnd { turn, .. } => Some(*turn),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![4, 5]);
}
