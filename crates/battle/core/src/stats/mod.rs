//! Stat model.
//!
//! ```text
//! [ BaseStats ]  ── immutable until `set_base`
//!      ↓
//! [ StatModifier* ]  ── owned by the combatant's EffectManager
//!      ↓
//! effective = (base + Σ flat) × Π (1 + percent)
//! ```
//!
//! Flat deltas are summed first; percentage multipliers from different
//! modifiers compose multiplicatively so N sources of +5% yield `1.05^N`.

mod base;
mod modifier;

pub use base::{BaseStats, Stat};
pub use modifier::{EffectDuration, StatModifier};

/// Applies flat deltas and percentage multipliers to a base value.
///
/// The result is floored at zero; no attribute is meaningful below it.
pub fn compose(
    base: f64,
    flats: impl IntoIterator<Item = f64>,
    percents: impl IntoIterator<Item = f64>,
) -> f64 {
    let flat_sum: f64 = flats.into_iter().sum();
    let product = percents.into_iter().fold(1.0, |acc, p| acc * (1.0 + p));
    ((base + flat_sum) * product).max(0.0)
}
