//! Per-battle publish/subscribe.
//!
//! Plugins and engine handlers subscribe to an [`EventKind`] on the battle's
//! [`EventBus`] and hold the returned [`Subscription`] for as long as they
//! want to be notified.

mod bus;
mod handler;
mod types;

pub use bus::{EventBus, Subscription, SubscriptionId};
pub use handler::{EventHandler, FnHandler, HandlerContext, HandlerCriticality};
pub use types::{BattleEvent, DamageSource, Details, EventKind, details};
