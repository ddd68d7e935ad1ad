//! Typed per-battle storage for plugins.
//!
//! Plugins keep their runtime data here instead of in statics, keyed by the
//! data's type and, for per-combatant data, by [`CombatantId`]. The store is
//! owned by the battle's [`BattleState`](crate::BattleState) and dropped
//! with it, so nothing leaks from one battle into the next.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use battle_core::CombatantId;

/// Values of type `T` keyed by combatant.
#[derive(Debug)]
pub struct PerCombatant<T>(BTreeMap<CombatantId, T>);

impl<T> Default for PerCombatant<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

#[derive(Default)]
pub struct PluginState {
    slots: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PluginState {
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Returns the value of type `T`, creating it with `Default` first.
    pub fn get_or_default<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        let slot = self
            .slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("plugin state slot keyed by its own TypeId"),
        }
    }

    /// Per-combatant value of type `T`, created on first access.
    pub fn for_combatant<T: Any + Send + Sync + Default>(&mut self, id: CombatantId) -> &mut T {
        self.get_or_default::<PerCombatant<T>>()
            .0
            .entry(id)
            .or_default()
    }

    pub fn combatant<T: Any + Send + Sync>(&self, id: CombatantId) -> Option<&T> {
        self.get::<PerCombatant<T>>()?.0.get(&id)
    }

    /// Drops every per-combatant value of type `T` belonging to `id`.
    pub fn forget_combatant<T: Any + Send + Sync>(&mut self, id: CombatantId) -> Option<T> {
        self.get_mut::<PerCombatant<T>>()?.0.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl fmt::Debug for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginState")
            .field("slots", &self.slots.len())
            .finish()
    }
}
