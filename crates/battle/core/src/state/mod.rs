//! Battle participants and their ownership.
//!
//! Combatants are owned by a [`Roster`] for the duration of one battle and
//! addressed everywhere else by their stable [`CombatantId`]. Nothing outside
//! the roster holds a reference to a combatant, so back-references (effect
//! sources, queue entries, plugin state) never extend a combatant's lifetime.

mod combatant;
mod ids;
mod roster;
mod vitals;

pub use combatant::Combatant;
pub use ids::{CombatantId, Side};
pub use roster::Roster;
pub use vitals::{DamageApplied, Vitals};
