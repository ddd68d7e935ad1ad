//! Damage types, flags and the hit/mitigation formula.

mod damage;
mod types;

pub use damage::{DamageRoll, heal_amount, mitigate, roll_attack};
pub use types::{DamageFlags, DamageType};
