//! Effect manager: timed modifiers and periodic damage/healing.
//!
//! Each combatant owns exactly one [`EffectManager`]. Every modifier, DoT and
//! HoT lives in one of its collections and nowhere else, so removal is
//! symmetric by construction: an effect is revoked by taking it out of the
//! collection, which can only happen once.
//!
//! The manager never publishes events itself. Mutations return
//! [`EffectNotice`]s that the runtime translates into `effect_applied` /
//! `effect_removed` bus events.

mod manager;
mod notice;
mod periodic;

pub use manager::{EffectManager, TickReport};
pub use notice::{EffectCategory, EffectNotice, EffectSummary, NoticeKind};
pub use periodic::{PeriodicEffect, PeriodicHit};
