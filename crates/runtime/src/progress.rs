//! One-way progress snapshots for UIs and telemetry.

use battle_core::{CombatantId, EffectSummary, EnrageState, QueueSlot, Side};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::state::{BattlePhase, BattleState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub hp: i64,
    pub max_hp: i64,
    pub shields: i64,
    pub ultimate_charge: u32,
    pub effects: Vec<EffectSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub turn: u32,
    pub phase: BattlePhase,
    /// Upcoming turn order, bonus turns first.
    pub queue: Vec<QueueSlot>,
    pub combatants: Vec<CombatantSnapshot>,
    pub enrage: EnrageState,
}

impl BattleSnapshot {
    pub fn capture(state: &BattleState) -> Self {
        Self {
            turn: state.turn,
            phase: state.phase,
            queue: state.queue.snapshot(),
            combatants: state
                .roster
                .iter()
                .map(|c| CombatantSnapshot {
                    id: c.id,
                    name: c.name.clone(),
                    side: c.side,
                    hp: c.hp(),
                    max_hp: c.max_hp(),
                    shields: c.shields(),
                    ultimate_charge: c.ultimate_charge,
                    effects: c.effects().summaries(),
                })
                .collect(),
            enrage: state.enrage.state().clone(),
        }
    }
}

/// Receives snapshots. Publishing must not block and must not fail the
/// battle; a sink with no listeners simply drops the snapshot.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, snapshot: BattleSnapshot);
}

impl ProgressSink for broadcast::Sender<BattleSnapshot> {
    fn publish(&self, snapshot: BattleSnapshot) {
        if self.send(snapshot).is_err() {
            tracing::trace!(target: "battle::progress", "no progress subscribers");
        }
    }
}

impl ProgressSink for mpsc::UnboundedSender<BattleSnapshot> {
    fn publish(&self, snapshot: BattleSnapshot) {
        if self.send(snapshot).is_err() {
            tracing::trace!(target: "battle::progress", "progress receiver dropped");
        }
    }
}
