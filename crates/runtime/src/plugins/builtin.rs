//! Plugins shipped with the runtime.

use battle_core::{CombatantId, Side};
use serde_json::Value;

use super::{BattlePlugin, PluginKind};
use crate::events::{
    BattleEvent, DamageSource, Details, EventBus, EventKind, HandlerContext, HandlerCriticality,
    Subscription, details,
};

fn is_party(ctx: &HandlerContext<'_>, id: CombatantId) -> bool {
    ctx.state
        .roster
        .get(id)
        .is_some_and(|c| c.side == Side::Party)
}

/// Relic: party members heal for a fraction of the action damage they deal.
#[derive(Debug, Clone)]
pub struct Lifesteal {
    pub fraction: f64,
}

impl Lifesteal {
    pub const ID: &'static str = "lifesteal";
}

impl Default for Lifesteal {
    fn default() -> Self {
        Self { fraction: 0.1 }
    }
}

impl BattlePlugin for Lifesteal {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Relic
    }

    fn attach(&self, bus: &EventBus) -> Vec<Subscription> {
        let fraction = self.fraction;
        let subscription = bus.subscribe_fn(
            EventKind::DamageDealt,
            Self::ID,
            HandlerCriticality::Important,
            move |event, ctx| {
                let BattleEvent::DamageDealt {
                    attacker: Some(attacker),
                    amount,
                    source: DamageSource::Action,
                    ..
                } = event
                else {
                    return Ok(());
                };
                if *amount <= 0 || !is_party(ctx, *attacker) {
                    return Ok(());
                }

                let mut out = Vec::new();
                let healed = ctx
                    .state
                    .heal(Some(*attacker), *attacker, *amount as f64 * fraction, &mut out);
                if healed > 0 {
                    out.push(BattleEvent::RelicEffect {
                        id: Self::ID.to_string(),
                        entity: *attacker,
                        effect_type: "heal".to_string(),
                        value: healed as f64,
                        details: Details::new(),
                    });
                }
                ctx.emit_all_batched(out);
                Ok(())
            },
        );
        vec![subscription]
    }
}

#[derive(Debug, Default)]
struct MomentumHits(u32);

/// Card: every `every`-th landed hit by a party member grants that member
/// an extra turn.
#[derive(Debug, Clone)]
pub struct Momentum {
    pub every: u32,
}

impl Momentum {
    pub const ID: &'static str = "momentum";
}

impl Default for Momentum {
    fn default() -> Self {
        Self { every: 3 }
    }
}

impl BattlePlugin for Momentum {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Card
    }

    fn attach(&self, bus: &EventBus) -> Vec<Subscription> {
        let every = self.every.max(2);
        let subscription = bus.subscribe_fn(
            EventKind::HitLanded,
            Self::ID,
            HandlerCriticality::Important,
            move |event, ctx| {
                let BattleEvent::HitLanded { attacker, .. } = event else {
                    return Ok(());
                };
                if !is_party(ctx, *attacker) || !ctx.is_alive(*attacker) {
                    return Ok(());
                }

                let hits = ctx.state.plugins.for_combatant::<MomentumHits>(*attacker);
                hits.0 += 1;
                if hits.0 % every != 0 {
                    return Ok(());
                }
                let count = hits.0;

                ctx.state.grant_extra_turn(*attacker)?;
                ctx.emit_batched(BattleEvent::CardEffect {
                    id: Self::ID.to_string(),
                    entity: *attacker,
                    effect_type: "extra_turn".to_string(),
                    value: 1.0,
                    details: details([("hits", Value::from(count))]),
                });
                Ok(())
            },
        );
        vec![subscription]
    }
}
