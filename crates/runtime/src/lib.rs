//! Async orchestration for turn-based auto-battles.
//!
//! `battle-runtime` drives one battle per [`BattleSession`]: it pulls actors
//! from the core action queue, asks an [`ActionProvider`] per side what to
//! do, executes the chosen [`Ability`] through the [`ActionRegistry`], and
//! publishes every state change on the battle's [`EventBus`], where relic
//! and card plugins react.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the turn loop, builder and task handle
//! - [`events`] provides the typed event bus and handler contract
//! - [`actions`] defines abilities, cooldowns and the action registry
//! - [`plugins`] holds relic/card plugins and their per-battle state
//! - [`providers`] supplies action choices (auto-battle, scripted, wait)
//! - [`progress`] and [`party`] describe what flows in and out of a battle
pub mod actions;
pub mod config;
pub mod error;
pub mod events;
pub mod party;
pub mod plugins;
pub mod progress;
pub mod providers;
pub mod session;
pub mod state;

pub use actions::{
    Ability, ActionContext, ActionOutcome, ActionRegistry, ActionRequest, ActionResult,
    CooldownBook, NormalAttack, Ultimate, Wait,
};
pub use config::{BatchConfig, RuntimeConfig};
pub use error::{ActionError, BattleError, HandlerError, Result};
pub use events::{
    BattleEvent, DamageSource, Details, EventBus, EventHandler, EventKind, FnHandler,
    HandlerContext, HandlerCriticality, Subscription, SubscriptionId,
};
pub use party::{BattleResult, Outcome, Party, RewardHook};
pub use plugins::{
    BattlePlugin, Lifesteal, Momentum, PerCombatant, PluginKind, PluginRegistry, PluginState,
};
pub use progress::{BattleSnapshot, CombatantSnapshot, ProgressSink};
pub use providers::{
    ActionProvider, AutoActionProvider, ScriptedActionProvider, WaitActionProvider,
};
pub use session::{BattleBuilder, BattleHandle, BattleSession};
pub use state::{BattlePhase, BattleState};
