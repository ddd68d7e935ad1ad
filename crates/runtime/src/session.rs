//! Battle session: the turn loop of one battle.
//!
//! A session owns everything its battle touches (roster, queue, bus,
//! plugin subscriptions, RNG) and runs as a single task. The only
//! suspension points are event dispatch, batch pacing and action providers.
//!
//! ```text
//! loop:
//!   flush batched events
//!   pull next actor            (skip if defeated)
//!   turn_start
//!   tick actor's effects       (effect / damage / heal events)
//!   refill action points, tick cooldowns
//!   actions until AP spent     (action_used + the action's events)
//!   turn_end
//!   enrage update
//!   credit defeated foes once
//!   terminal check
//! ```
//!
//! Each iteration, as well as the start and end announcements, runs under
//! the configured turn timeout.

use std::collections::BTreeSet;
use std::sync::Arc;

use battle_core::{BattleRng, Combatant, CombatantId, NoticeKind, Roster, Side};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::actions::{ActionRegistry, ActionRequest};
use crate::config::RuntimeConfig;
use crate::error::{BattleError, HandlerError, Result};
use crate::events::{
    BattleEvent, DamageSource, EventBus, EventHandler, EventKind, HandlerContext,
    HandlerCriticality, Subscription, details,
};
use crate::party::{BattleResult, Outcome, Party, RewardHook};
use crate::plugins::{BattlePlugin, PluginRegistry};
use crate::progress::{BattleSnapshot, ProgressSink};
use crate::providers::{ActionProvider, AutoActionProvider};
use crate::state::{BattlePhase, BattleState};

/// Handle to a battle running on its own task.
pub struct BattleHandle {
    join: JoinHandle<Result<BattleResult>>,
    cancel: watch::Sender<bool>,
}

impl BattleHandle {
    /// Requests cancellation. The battle releases its subscriptions and
    /// resolves to [`BattleError::Cancelled`].
    pub fn cancel(&self) {
        // Nobody listening means the battle already finished.
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn join(self) -> Result<BattleResult> {
        self.join.await.map_err(BattleError::Join)?
    }
}

/// Builder for [`BattleSession`].
pub struct BattleBuilder {
    party: Party,
    foes: Vec<Combatant>,
    config: RuntimeConfig,
    actions: ActionRegistry,
    plugins: PluginRegistry,
    party_provider: Box<dyn ActionProvider>,
    foe_provider: Box<dyn ActionProvider>,
    progress: Option<Arc<dyn ProgressSink>>,
    rewards: Option<Arc<dyn RewardHook>>,
    extra_plugins: Vec<Box<dyn BattlePlugin>>,
}

impl BattleBuilder {
    fn new(party: Party, foes: Vec<Combatant>) -> Self {
        Self {
            party,
            foes,
            config: RuntimeConfig::default(),
            actions: ActionRegistry::with_builtin_actions(),
            plugins: PluginRegistry::with_builtin_plugins(),
            party_provider: Box::new(AutoActionProvider),
            foe_provider: Box::new(AutoActionProvider),
            progress: None,
            rewards: None,
            extra_plugins: Vec::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    /// Factory table used to resolve the party's relic and card ids.
    pub fn plugin_registry(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Adds a plugin instance outside the party's relics and cards
    /// (foe passives, encounter modifiers).
    pub fn plugin(mut self, plugin: impl BattlePlugin + 'static) -> Self {
        self.extra_plugins.push(Box::new(plugin));
        self
    }

    pub fn party_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.party_provider = Box::new(provider);
        self
    }

    pub fn foe_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.foe_provider = Box::new(provider);
        self
    }

    pub fn progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    pub fn rewards(mut self, hook: Arc<dyn RewardHook>) -> Self {
        self.rewards = Some(hook);
        self
    }

    pub fn build(self) -> Result<BattleSession> {
        let Party {
            members,
            gold,
            relics,
            cards,
        } = self.party;
        if members.is_empty() || self.foes.is_empty() {
            return Err(BattleError::NoCombatants);
        }

        let mut roster = Roster::new();
        for mut combatant in members {
            combatant.side = Side::Party;
            let id = combatant.id;
            if !roster.insert(combatant) {
                return Err(BattleError::DuplicateCombatant(id));
            }
        }
        for mut combatant in self.foes {
            combatant.side = Side::Foe;
            let id = combatant.id;
            if !roster.insert(combatant) {
                return Err(BattleError::DuplicateCombatant(id));
            }
        }

        let rng = BattleRng::from_seed(self.config.seed);
        let state = BattleState::new(roster, self.config.battle.clone(), rng)?;
        let bus = EventBus::with_log_capacity(self.config.event_log_capacity);

        let mut plugins = Vec::new();
        for id in relics.iter().chain(&cards) {
            match self.plugins.create(id) {
                Some(plugin) => plugins.push(plugin),
                None => warn!(target: "battle::session", plugin = %id, "unknown plugin, skipping"),
            }
        }
        plugins.extend(self.extra_plugins);

        let mut subscriptions = Vec::new();
        for plugin in &plugins {
            let subs = plugin.attach(&bus);
            debug!(
                target: "battle::session",
                plugin = plugin.id(),
                kind = %plugin.kind(),
                subscriptions = subs.len(),
                "plugin attached"
            );
            subscriptions.extend(subs);
        }

        Ok(BattleSession {
            state,
            bus,
            actions: self.actions,
            party_provider: self.party_provider,
            foe_provider: self.foe_provider,
            progress: self.progress,
            rewards: self.rewards,
            plugins,
            subscriptions,
            config: self.config,
            gold,
            relics,
            cards,
            credited: BTreeSet::new(),
            defeated_foes: Vec::new(),
            current_actor: None,
            exhausted: false,
        })
    }
}

pub struct BattleSession {
    state: BattleState,
    bus: EventBus,
    actions: ActionRegistry,
    party_provider: Box<dyn ActionProvider>,
    foe_provider: Box<dyn ActionProvider>,
    progress: Option<Arc<dyn ProgressSink>>,
    rewards: Option<Arc<dyn RewardHook>>,
    plugins: Vec<Box<dyn BattlePlugin>>,
    subscriptions: Vec<Subscription>,
    config: RuntimeConfig,
    gold: u64,
    relics: Vec<String>,
    cards: Vec<String>,
    credited: BTreeSet<CombatantId>,
    defeated_foes: Vec<CombatantId>,
    current_actor: Option<CombatantId>,
    exhausted: bool,
}

impl BattleSession {
    pub fn builder(party: Party, foes: Vec<Combatant>) -> BattleBuilder {
        BattleBuilder::new(party, foes)
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// The battle's bus. Clones share subscribers with the session.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribes a handler whose subscription the session owns and
    /// releases when the battle ends.
    pub fn subscribe(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let subscription = self.bus.subscribe(kind, handler);
        self.subscriptions.push(subscription);
    }

    /// Closure form of [`subscribe`](Self::subscribe).
    pub fn subscribe_fn<F>(
        &mut self,
        kind: EventKind,
        name: impl Into<String>,
        criticality: HandlerCriticality,
        f: F,
    ) where
        F: Fn(&BattleEvent, &mut HandlerContext<'_>) -> std::result::Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        let subscription = self.bus.subscribe_fn(kind, name, criticality, f);
        self.subscriptions.push(subscription);
    }

    pub fn plugin_ids(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.id()).collect()
    }

    /// Runs the battle to completion on the current task.
    pub async fn run(self) -> Result<BattleResult> {
        let (_cancel, cancelled) = watch::channel(false);
        self.run_until_cancelled(cancelled).await
    }

    /// Runs the battle on its own task.
    pub fn spawn(self) -> BattleHandle {
        let (cancel, cancelled) = watch::channel(false);
        let join = tokio::spawn(self.run_until_cancelled(cancelled));
        BattleHandle { join, cancel }
    }

    /// Runs until the battle ends or `cancel` turns true.
    ///
    /// Plugin subscriptions are released on every exit path.
    pub async fn run_until_cancelled(
        mut self,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BattleResult> {
        info!(
            target: "battle::session",
            seed = self.config.seed,
            party = self.state.roster.side(Side::Party).count(),
            foes = self.state.roster.side(Side::Foe).count(),
            plugins = self.plugins.len(),
            "battle starting"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Err(BattleError::Cancelled),
            outcome = self.drive() => outcome,
        };

        self.release_plugins();

        match outcome {
            Ok(outcome) => Ok(self.finish(outcome)),
            Err(err) => {
                self.state.phase = BattlePhase::BattleOver;
                match &err {
                    BattleError::Cancelled => warn!(
                        target: "battle::session",
                        turn = self.state.turn,
                        "battle cancelled"
                    ),
                    _ => error!(
                        target: "battle::session",
                        turn = self.state.turn,
                        error = %err,
                        "battle aborted"
                    ),
                }
                Err(err)
            }
        }
    }

    async fn drive(&mut self) -> Result<Outcome> {
        let timeout = self.config.turn_timeout;
        match tokio::time::timeout(timeout, self.begin()).await {
            Ok(result) => result?,
            Err(_) => return Err(self.timed_out()),
        }

        loop {
            if let Some(outcome) = self.outcome() {
                self.current_actor = None;
                match tokio::time::timeout(timeout, self.end(outcome)).await {
                    Ok(result) => result?,
                    Err(_) => return Err(self.timed_out()),
                }
                return Ok(outcome);
            }

            match tokio::time::timeout(timeout, self.play_turn()).await {
                Ok(result) => result?,
                Err(_) => return Err(self.timed_out()),
            }
        }
    }

    async fn begin(&mut self) -> Result<()> {
        let ids: Vec<CombatantId> = self.state.roster.iter().map(|c| c.id).collect();
        for entity in ids {
            self.emit(BattleEvent::BattleStart { entity }).await?;
        }
        self.publish_progress();
        Ok(())
    }

    async fn end(&mut self, outcome: Outcome) -> Result<()> {
        self.state.phase = BattlePhase::BattleOver;
        self.bus
            .flush_batched(&mut self.state, &self.config.batch)
            .await?;
        self.credit_defeated_foes();

        let ids: Vec<CombatantId> = self.state.roster.iter().map(|c| c.id).collect();
        for entity in ids {
            self.emit(BattleEvent::BattleEnd { entity }).await?;
        }
        self.publish_progress();
        info!(
            target: "battle::session",
            %outcome,
            turns = self.state.turn,
            "battle over"
        );
        Ok(())
    }

    /// One actor iteration.
    async fn play_turn(&mut self) -> Result<()> {
        self.current_actor = None;
        self.bus
            .flush_batched(&mut self.state, &self.config.batch)
            .await?;
        self.credit_defeated_foes();
        if self.outcome().is_some() {
            return Ok(());
        }

        let state = &mut self.state;
        let roster = &state.roster;
        let Some(turn) = state.queue.next_actor(|id| roster.is_alive(id)) else {
            return Err(BattleError::Structural(
                "action queue has no living combatant".to_string(),
            ));
        };
        state.queue.verify()?;

        let actor = turn.actor;
        let Some(side) = state.roster.get(actor).filter(|c| c.is_alive()).map(|c| c.side) else {
            return Ok(());
        };

        state.turn += 1;
        state.phase = BattlePhase::for_side(side);
        self.current_actor = Some(actor);
        let turn_number = self.state.turn;
        debug!(
            target: "battle::session",
            turn = turn_number,
            actor = %actor,
            bonus = turn.bonus,
            "turn start"
        );

        self.emit(BattleEvent::TurnStart {
            actor,
            turn: turn_number,
            bonus: turn.bonus,
        })
        .await?;

        self.tick_effects(actor).await?;

        if self.state.roster.is_alive(actor) {
            let ap = self.state.config.action_points_per_turn;
            if let Some(combatant) = self.state.roster.get_mut(actor) {
                combatant.action_points = ap;
            }
            self.state.cooldowns.tick(actor);
            self.take_actions(actor, side).await?;
        }

        self.emit(BattleEvent::TurnEnd {
            actor,
            turn: turn_number,
        })
        .await?;

        self.advance_enrage().await?;
        self.credit_defeated_foes();
        self.publish_progress();
        Ok(())
    }

    /// Runs the actor's once-per-turn effect tick and publishes the results.
    async fn tick_effects(&mut self, actor: CombatantId) -> Result<()> {
        let Some(combatant) = self.state.roster.get_mut(actor) else {
            return Ok(());
        };
        let report = combatant.tick_effects();
        let speed = combatant.speed();
        if self.state.queue.contains(actor) {
            self.state.queue.sync_speed(actor, speed)?;
        }

        let mut events = Vec::new();
        for hit in &report.damage {
            let amount = hit.amount + hit.absorbed;
            if amount <= 0 {
                continue;
            }
            events.push(BattleEvent::DamageDealt {
                attacker: hit.source,
                target: actor,
                amount,
                damage_type: hit.damage_type,
                source: DamageSource::Periodic,
                source_action: Some(hit.effect_id.clone()),
                action_name: hit.effect_id.clone(),
                details: details([("absorbed", Value::from(hit.absorbed))]),
            });
            events.push(BattleEvent::DamageTaken {
                target: actor,
                attacker: hit.source,
                amount,
                damage_type: hit.damage_type,
                details: details([
                    ("absorbed", Value::from(hit.absorbed)),
                    ("hp_lost", Value::from(hit.amount)),
                ]),
            });
        }
        for heal in &report.healing {
            if heal.amount > 0 {
                events.push(BattleEvent::HealReceived {
                    target: actor,
                    healer: heal.source,
                    amount: heal.amount,
                    details: details([("effect", Value::from(heal.effect_id.clone()))]),
                });
            }
        }
        for notice in &report.notices {
            match notice.kind {
                NoticeKind::Ticked => events.push(BattleEvent::EffectApplied {
                    effect_name: notice.name.clone(),
                    entity: actor,
                    details: details([
                        ("category", Value::from(notice.category.to_string())),
                        ("ticked", Value::from(true)),
                        ("amount", Value::from(notice.amount.unwrap_or(0))),
                        ("remaining", Value::from(notice.remaining)),
                    ]),
                }),
                kind if kind.is_removal() => events.push(BattleEvent::effect_removed(
                    notice.name.clone(),
                    actor,
                    notice.category.to_string(),
                )),
                _ => {}
            }
        }

        for event in events {
            self.emit(event).await?;
        }
        Ok(())
    }

    async fn take_actions(&mut self, actor: CombatantId, side: Side) -> Result<()> {
        let mut taken = 0u32;

        loop {
            let ready = self
                .state
                .roster
                .get(actor)
                .is_some_and(|c| c.is_alive() && c.action_points > 0);
            if !ready || self.outcome().is_some() || taken >= self.config.max_actions_per_turn {
                return Ok(());
            }
            taken += 1;

            let provider = match side {
                Side::Party => &self.party_provider,
                Side::Foe => &self.foe_provider,
            };
            let request = provider.provide_action(actor, &self.state).await?;

            let outcome = match self.actions.run(&request, actor, &mut self.state) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        target: "battle::session",
                        actor = %actor,
                        action = %request.action,
                        error = %err,
                        "action rejected, ending turn"
                    );
                    return self.fallback_wait(actor).await;
                }
            };

            self.emit(BattleEvent::ActionUsed {
                actor,
                action: outcome.action.clone(),
            })
            .await?;
            for event in outcome.events {
                self.emit(event).await?;
            }
            if outcome.ends_turn {
                return Ok(());
            }
        }
    }

    async fn fallback_wait(&mut self, actor: CombatantId) -> Result<()> {
        let request = ActionRequest::wait();
        if let Ok(outcome) = self.actions.run(&request, actor, &mut self.state) {
            self.emit(BattleEvent::ActionUsed {
                actor,
                action: outcome.action,
            })
            .await?;
        }
        Ok(())
    }

    async fn advance_enrage(&mut self) -> Result<()> {
        let tick = self.state.enrage.advance();
        if tick.activated {
            info!(
                target: "battle::session",
                turn = self.state.turn,
                threshold = self.state.enrage.state().threshold,
                "enrage active"
            );
        }

        let mut events = Vec::new();
        if let Some(modifier) = tick.foe_modifier {
            for foe in self.state.roster.living_ids(Side::Foe) {
                self.state.apply_modifier(foe, modifier.clone(), &mut events)?;
            }
        }
        if let Some(bleed) = tick.party_bleed {
            for member in self.state.roster.living_ids(Side::Party) {
                let max_hp = self
                    .state
                    .roster
                    .get(member)
                    .map_or(0, Combatant::max_hp);
                self.state.apply_dot(member, bleed.effect_for(max_hp), &mut events);
            }
        }
        if tick.exhausted && !self.exhausted {
            warn!(
                target: "battle::session",
                turn = self.state.turn,
                "turn limit reached"
            );
            self.exhausted = true;
        }

        for event in events {
            self.emit(event).await?;
        }
        Ok(())
    }

    /// Credits each newly defeated foe exactly once and drops it from the
    /// queue.
    fn credit_defeated_foes(&mut self) {
        let newly: Vec<CombatantId> = self
            .state
            .roster
            .side(Side::Foe)
            .filter(|c| c.is_defeated() && !self.credited.contains(&c.id))
            .map(|c| c.id)
            .collect();

        for id in newly {
            self.credited.insert(id);
            self.defeated_foes.push(id);
            self.state.queue.remove(id);
            if let (Some(rewards), Some(foe)) = (&self.rewards, self.state.roster.get(id)) {
                rewards.foe_defeated(foe);
            }
            debug!(target: "battle::session", foe = %id, "foe defeated");
        }
    }

    /// Terminal check. A wiped party loses even if the last foe fell in
    /// the same turn.
    fn outcome(&self) -> Option<Outcome> {
        if self.state.roster.all_defeated(Side::Party) || self.exhausted {
            Some(Outcome::Defeat)
        } else if self.state.roster.all_defeated(Side::Foe) {
            Some(Outcome::Victory)
        } else {
            None
        }
    }

    async fn emit(&mut self, event: BattleEvent) -> Result<()> {
        self.bus.emit(event, &mut self.state).await
    }

    fn publish_progress(&self) {
        if let Some(sink) = &self.progress {
            sink.publish(BattleSnapshot::capture(&self.state));
        }
    }

    fn timed_out(&self) -> BattleError {
        let recent_events = self.bus.recent_events();
        error!(
            target: "battle::session",
            turn = self.state.turn,
            actor = ?self.current_actor,
            timeout_ms = self.config.turn_timeout.as_millis() as u64,
            recent = recent_events.len(),
            "turn timed out"
        );
        for event in &recent_events {
            error!(target: "battle::session", ?event, "recent event");
        }
        BattleError::TurnTimeout {
            actor: self.current_actor,
            turn: self.state.turn,
            timeout: self.config.turn_timeout,
            recent_events,
        }
    }

    /// Drops every plugin subscription, unsubscribing its handler.
    fn release_plugins(&mut self) {
        let released = self.subscriptions.len();
        self.subscriptions.clear();
        self.plugins.clear();
        debug!(target: "battle::session", released, "plugin subscriptions released");
    }

    fn finish(self, outcome: Outcome) -> BattleResult {
        let turns = self.state.turn;
        let enrage = self.state.enrage.state().clone();
        let (mut members, _foes) = self.state.roster.into_sides();
        for member in &mut members {
            member.clear_effects();
            member.action_points = 0;
        }

        let result = BattleResult {
            outcome,
            party: Party {
                members,
                gold: self.gold,
                relics: self.relics,
                cards: self.cards,
            },
            turns,
            defeated_foes: self.defeated_foes,
            enrage,
        };
        if let Some(rewards) = &self.rewards {
            rewards.battle_finished(&result);
        }
        result
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        // Sender gone without cancelling: never cancel.
        std::future::pending::<()>().await;
    }
}
