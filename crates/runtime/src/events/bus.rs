//! Per-battle event bus.
//!
//! Handlers run in subscription order. Direct emission awaits every handler
//! before returning; batched emission only buffers, and the buffer is drained
//! by [`EventBus::flush_batched`] before the next actor is pulled. Handlers
//! never emit inline, so a handler reacting to an event can only enqueue
//! follow-ups for the next pass.

use std::collections::{BTreeMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use futures_util::FutureExt;
use tracing::{debug, error, trace};

use super::handler::{EventHandler, FnHandler, HandlerContext, HandlerCriticality};
use super::types::{BattleEvent, EventKind};
use crate::config::BatchConfig;
use crate::error::{BattleError, HandlerError, Result};
use crate::state::BattleState;

/// Identifies one subscription on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: BTreeMap<EventKind, Vec<(SubscriptionId, Arc<dyn EventHandler>)>>,
}

impl Registry {
    fn remove(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        list.len() != before
    }
}

/// Owned subscription handle. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            write(&registry).remove(self.kind, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Bounded ring of the most recently emitted events.
struct EventLog {
    capacity: usize,
    events: VecDeque<BattleEvent>,
}

impl EventLog {
    fn record(&mut self, event: &BattleEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
    }
}

/// Event bus owned by a single battle.
///
/// Cloning shares the same subscribers, backlog and event log.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
    pending: Arc<Mutex<VecDeque<BattleEvent>>>,
    log: Arc<Mutex<EventLog>>,
}

impl EventBus {
    pub const DEFAULT_LOG_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_log_capacity(Self::DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            log: Arc::new(Mutex::new(EventLog {
                capacity,
                events: VecDeque::with_capacity(capacity.min(1024)),
            })),
        }
    }

    /// Registers `handler` for `kind`, after every existing handler.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Subscription {
        let mut registry = write(&self.registry);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.entry(kind).or_default().push((id, handler));
        trace!(target: "battle::bus", %kind, subscription = id.0, "subscribed");

        Subscription {
            id,
            kind,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Registers a synchronous closure.
    pub fn subscribe_fn<F>(
        &self,
        kind: EventKind,
        name: impl Into<String>,
        criticality: HandlerCriticality,
        f: F,
    ) -> Subscription
    where
        F: Fn(&BattleEvent, &mut HandlerContext<'_>) -> std::result::Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(kind, Arc::new(FnHandler::new(name, criticality, f)))
    }

    /// Removes a subscription without its handle. Returns false if it was
    /// already gone.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        write(&self.registry).remove(kind, id)
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        read(&self.registry)
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn total_subscribers(&self) -> usize {
        read(&self.registry).handlers.values().map(Vec::len).sum()
    }

    /// Delivers `event` to every subscriber of its kind, in order.
    ///
    /// A failing handler is logged and skipped unless it is
    /// [`HandlerCriticality::Critical`], in which case the failure is
    /// returned and the remaining handlers do not run. A panicking handler
    /// counts as a failed one.
    pub async fn emit(&self, event: BattleEvent, state: &mut BattleState) -> Result<()> {
        let kind = event.kind();
        lock(&self.log).record(&event);

        let handlers: Vec<Arc<dyn EventHandler>> = {
            let registry = read(&self.registry);
            match registry.handlers.get(&kind) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return Ok(()),
            }
        };

        for handler in handlers {
            let mut ctx = HandlerContext::new(state, self);
            let outcome = AssertUnwindSafe(handler.handle(&event, &mut ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(HandlerError::panicked(payload)));
            if let Err(err) = outcome {
                self.handle_failure(handler.as_ref(), kind, err)?;
            }
        }
        Ok(())
    }

    /// Buffers `event` for the next [`flush_batched`](Self::flush_batched).
    pub fn emit_batched(&self, event: BattleEvent) {
        lock(&self.pending).push_back(event);
    }

    pub fn pending_batched(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Drains the batched backlog, pass by pass, until it is empty.
    ///
    /// Events batched by handlers during a pass are delivered in the next
    /// pass. Between passes the bus yields, sleeping longer as the backlog
    /// grows. Returns the number of events delivered.
    pub async fn flush_batched(
        &self,
        state: &mut BattleState,
        config: &BatchConfig,
    ) -> Result<usize> {
        let mut passes = 0u32;
        let mut delivered = 0usize;

        loop {
            let batch: Vec<BattleEvent> = lock(&self.pending).drain(..).collect();
            if batch.is_empty() {
                return Ok(delivered);
            }

            passes += 1;
            if passes > config.max_passes {
                let pending = batch.len();
                // Keep the backlog visible for diagnostics.
                lock(&self.pending).extend(batch);
                return Err(BattleError::EventStorm {
                    passes: config.max_passes,
                    pending,
                });
            }

            debug!(
                target: "battle::bus",
                pass = passes,
                events = batch.len(),
                "flushing batched events"
            );
            for event in batch {
                self.emit(event, state).await?;
                delivered += 1;
            }

            let delay = config.delay_for(self.pending_batched());
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Most recent events, oldest first.
    pub fn recent_events(&self) -> Vec<BattleEvent> {
        lock(&self.log).events.iter().cloned().collect()
    }

    fn handle_failure(
        &self,
        handler: &dyn EventHandler,
        kind: EventKind,
        err: HandlerError,
    ) -> Result<()> {
        match handler.criticality() {
            HandlerCriticality::Critical => {
                error!(
                    target: "battle::bus",
                    handler = handler.name(),
                    event = %kind,
                    criticality = "critical",
                    error = %err,
                    "Critical handler failed, aborting battle"
                );
                Err(BattleError::Handler {
                    handler: handler.name().to_string(),
                    event: kind,
                    source: err,
                })
            }
            HandlerCriticality::Important => {
                error!(
                    target: "battle::bus",
                    handler = handler.name(),
                    event = %kind,
                    criticality = "important",
                    error = %err,
                    "Handler failed, continuing"
                );
                Ok(())
            }
            HandlerCriticality::Optional => {
                debug!(
                    target: "battle::bus",
                    handler = handler.name(),
                    event = %kind,
                    criticality = "optional",
                    error = %err,
                    "Optional handler failed"
                );
                Ok(())
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Lock helpers; poisoned locks are recovered.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
