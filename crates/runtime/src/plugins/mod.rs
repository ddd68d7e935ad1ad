//! Cards, relics and passives.
//!
//! A plugin reacts to battle events. It is created per battle from an
//! explicit factory table ([`PluginRegistry`]), subscribes its handlers in
//! [`BattlePlugin::attach`], and the session drops the returned
//! [`Subscription`]s when the battle ends, which unsubscribes them.

mod builtin;
mod state;

pub use builtin::{Lifesteal, Momentum};
pub use state::{PerCombatant, PluginState};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::{EventBus, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PluginKind {
    Card,
    Relic,
    Passive,
}

pub trait BattlePlugin: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> PluginKind;

    /// Subscribes the plugin's handlers. The battle keeps the handles and
    /// drops them at battle end.
    fn attach(&self, bus: &EventBus) -> Vec<Subscription>;
}

type PluginFactory = Arc<dyn Fn() -> Box<dyn BattlePlugin> + Send + Sync>;

/// Explicit table from plugin id to factory, filled at startup.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the plugins shipped with the runtime.
    pub fn with_builtin_plugins() -> Self {
        let mut registry = Self::new();
        registry.register(Lifesteal::ID, || Box::new(Lifesteal::default()));
        registry.register(Momentum::ID, || Box::new(Momentum::default()));
        registry
    }

    /// Registers a factory, replacing any factory with the same id.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn BattlePlugin> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
        self
    }

    /// Creates a fresh instance for one battle.
    pub fn create(&self, id: &str) -> Option<Box<dyn BattlePlugin>> {
        self.factories.get(id).map(|factory| factory())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
