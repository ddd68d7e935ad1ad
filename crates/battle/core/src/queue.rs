//! Speed-based action queue.
//!
//! Each combatant carries an action value: the remaining "time" until its
//! next turn. Lower values act sooner.
//!
//! ```text
//! baseline      = K / speed
//! next_actor()  = argmin(action_value, tie_break)
//!                 every other entry -= winner.action_value   (floored at 0)
//!                 winner.action_value = winner.baseline
//! ```
//!
//! The queue is not a strict ping-pong between sides: a combatant twice as
//! fast as its opponent acts twice for every opposing turn.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::config::BattleConfig;
use crate::error::QueueError;
use crate::rng::BattleRng;
use crate::state::CombatantId;

/// The combatant whose turn it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Turn {
    pub actor: CombatantId,
    /// Extra turn granted outside the normal ordering.
    pub bonus: bool,
}

/// One row of a queue projection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueSlot {
    pub id: CombatantId,
    pub action_value: f64,
    pub bonus: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct QueueEntry {
    id: CombatantId,
    action_value: f64,
    baseline: f64,
    /// Fixed at insertion; never re-rolled.
    tie_break: u32,
}

impl QueueEntry {
    fn order(&self, other: &Self) -> Ordering {
        self.action_value
            .total_cmp(&other.action_value)
            .then(self.tie_break.cmp(&other.tie_break))
    }
}

/// Turn order for one battle.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionQueue {
    constant: f64,
    entries: Vec<QueueEntry>,
    bonus_turns: VecDeque<CombatantId>,
    next_tie_break: u32,
}

impl ActionQueue {
    /// Builds a queue for the given `(id, speed)` pairs.
    ///
    /// Tie-break offsets are a seeded shuffle of the insertion order, so two
    /// battles with the same seed and roster order identically.
    pub fn new(
        constant: f64,
        combatants: impl IntoIterator<Item = (CombatantId, f64)>,
        rng: &mut BattleRng,
    ) -> Result<Self, QueueError> {
        let combatants: Vec<(CombatantId, f64)> = combatants.into_iter().collect();
        let mut offsets: Vec<u32> = (0..combatants.len() as u32).collect();
        rng.shuffle(&mut offsets);

        let mut queue = Self {
            constant,
            entries: Vec::with_capacity(combatants.len()),
            bonus_turns: VecDeque::new(),
            next_tie_break: combatants.len() as u32,
        };
        for ((id, speed), tie_break) in combatants.into_iter().zip(offsets) {
            queue.push_entry(id, speed, tie_break)?;
        }
        Ok(queue)
    }

    /// Convenience constructor using [`BattleConfig::action_value_constant`].
    pub fn from_config(
        config: &BattleConfig,
        combatants: impl IntoIterator<Item = (CombatantId, f64)>,
        rng: &mut BattleRng,
    ) -> Result<Self, QueueError> {
        Self::new(config.action_value_constant, combatants, rng)
    }

    /// Computes `K / speed`, raising tiny speeds to [`BattleConfig::MIN_SPEED`].
    ///
    /// A frozen combatant (speed 0) still gets a finite, very large baseline.
    pub fn baseline_for(constant: f64, speed: f64) -> f64 {
        constant / speed.max(BattleConfig::MIN_SPEED)
    }

    fn push_entry(
        &mut self,
        id: CombatantId,
        speed: f64,
        tie_break: u32,
    ) -> Result<(), QueueError> {
        if !speed.is_finite() {
            return Err(QueueError::InvalidSpeed { id, speed });
        }
        if self.contains(id) {
            return Err(QueueError::DuplicateCombatant(id));
        }
        let baseline = Self::baseline_for(self.constant, speed);
        self.entries.push(QueueEntry {
            id,
            action_value: baseline,
            baseline,
            tie_break,
        });
        Ok(())
    }

    /// Adds a combatant mid-battle (summon, revival) at its full baseline.
    pub fn insert(&mut self, id: CombatantId, speed: f64) -> Result<(), QueueError> {
        let tie_break = self.next_tie_break;
        self.push_entry(id, speed, tie_break)?;
        self.next_tie_break += 1;
        Ok(())
    }

    /// Removes a combatant and any pending bonus turns it had.
    pub fn remove(&mut self, id: CombatantId) -> bool {
        self.bonus_turns.retain(|&bonus| bonus != id);
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn action_value(&self, id: CombatantId) -> Option<f64> {
        self.entry(id).map(|e| e.action_value)
    }

    pub fn baseline(&self, id: CombatantId) -> Option<f64> {
        self.entry(id).map(|e| e.baseline)
    }

    fn entry(&self, id: CombatantId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: CombatantId) -> Result<&mut QueueEntry, QueueError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(QueueError::UnknownCombatant(id))
    }

    /// Pops the next actor among entries for which `is_alive` holds.
    ///
    /// Pending bonus turns are served first and leave every action value
    /// untouched. Returns `None` when nobody living is queued.
    pub fn next_actor(&mut self, is_alive: impl Fn(CombatantId) -> bool) -> Option<Turn> {
        while let Some(actor) = self.bonus_turns.pop_front() {
            if self.contains(actor) && is_alive(actor) {
                return Some(Turn { actor, bonus: true });
            }
        }

        let winner = self
            .entries
            .iter()
            .filter(|e| is_alive(e.id))
            .min_by(|a, b| a.order(b))
            .map(|e| (e.id, e.action_value))?;
        let (actor, elapsed) = winner;

        for entry in &mut self.entries {
            if entry.id == actor {
                entry.action_value = entry.baseline;
            } else if is_alive(entry.id) {
                entry.action_value = (entry.action_value - elapsed).max(0.0);
            }
        }

        Some(Turn {
            actor,
            bonus: false,
        })
    }

    /// Grants `id` an immediate extra turn on the next `next_actor` call.
    pub fn grant_extra_turn(&mut self, id: CombatantId) -> Result<(), QueueError> {
        if !self.contains(id) {
            return Err(QueueError::UnknownCombatant(id));
        }
        self.bonus_turns.push_back(id);
        Ok(())
    }

    pub fn pending_bonus_turns(&self) -> usize {
        self.bonus_turns.len()
    }

    /// Forces an action value (haste, delay). Negative values clamp to 0.
    pub fn set_action_value(&mut self, id: CombatantId, value: f64) -> Result<(), QueueError> {
        if !value.is_finite() {
            return Err(QueueError::InvalidActionValue { id, value });
        }
        self.entry_mut(id)?.action_value = value.max(0.0);
        Ok(())
    }

    /// Recomputes a baseline after the combatant's speed changed.
    ///
    /// The current action value is kept; the new baseline applies from the
    /// combatant's next reset. Speeds at or below zero clamp to
    /// [`BattleConfig::MIN_SPEED`].
    pub fn sync_speed(&mut self, id: CombatantId, speed: f64) -> Result<(), QueueError> {
        if !speed.is_finite() {
            return Err(QueueError::InvalidSpeed { id, speed });
        }
        let constant = self.constant;
        self.entry_mut(id)?.baseline = Self::baseline_for(constant, speed);
        Ok(())
    }

    /// Ordered projection for UI and telemetry. Pure: calling it any number
    /// of times without `next_actor` in between yields identical results.
    pub fn snapshot(&self) -> Vec<QueueSlot> {
        let mut ordered: Vec<&QueueEntry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| a.order(b));

        self.bonus_turns
            .iter()
            .map(|&id| QueueSlot {
                id,
                action_value: 0.0,
                bonus: true,
            })
            .chain(ordered.into_iter().map(|e| QueueSlot {
                id: e.id,
                action_value: e.action_value,
                bonus: false,
            }))
            .collect()
    }

    /// Checks structural invariants: every value finite and non-negative.
    pub fn verify(&self) -> Result<(), QueueError> {
        for entry in &self.entries {
            if !entry.action_value.is_finite() || entry.action_value < 0.0 {
                return Err(QueueError::InvalidActionValue {
                    id: entry.id,
                    value: entry.action_value,
                });
            }
        }
        Ok(())
    }
}
