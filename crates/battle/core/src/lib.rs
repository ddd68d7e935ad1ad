//! Deterministic combat mechanics shared by the battle runtime and tools.
//!
//! `battle-core` defines the canonical rules (stats, effects, turn order,
//! enrage pressure, damage math) and exposes synchronous APIs with no I/O.
//! The async orchestration layer lives in `battle-runtime`; it consumes the
//! types re-exported here and turns their reports into bus events.
pub mod combat;
pub mod config;
pub mod effects;
pub mod enrage;
pub mod error;
pub mod queue;
pub mod rng;
pub mod state;
pub mod stats;

pub use combat::{DamageFlags, DamageRoll, DamageType};
pub use config::{BattleConfig, EnrageConfig};
pub use effects::{
    EffectCategory, EffectManager, EffectNotice, EffectSummary, NoticeKind, PeriodicEffect,
    PeriodicHit, TickReport,
};
pub use enrage::{EnrageController, EnrageState, EnrageTick, PartyBleed};
pub use error::{QueueError, StatError};
pub use queue::{ActionQueue, QueueSlot, Turn};
pub use rng::BattleRng;
pub use state::{Combatant, CombatantId, DamageApplied, Roster, Side, Vitals};
pub use stats::{BaseStats, EffectDuration, Stat, StatModifier};
