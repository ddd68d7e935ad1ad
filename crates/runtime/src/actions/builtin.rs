//! Actions every combatant has.

use battle_core::DamageType;

use super::{Ability, ActionContext, ActionResult};

/// Single-target hit that builds ultimate charge.
#[derive(Debug, Clone)]
pub struct NormalAttack {
    pub multiplier: f64,
    pub charge_gain: u32,
}

impl NormalAttack {
    pub const ID: &'static str = "normal_attack";
}

impl Default for NormalAttack {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            charge_gain: 5,
        }
    }
}

impl Ability for NormalAttack {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn can_execute(&self, ctx: &ActionContext<'_>) -> bool {
        !ctx.living_enemy_targets().is_empty()
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        let Some(target) = ctx.living_enemy_targets().first().copied() else {
            return ActionResult::failed("no living target");
        };

        let mut result = ActionResult::succeeded();
        let mut events = Vec::new();
        if let Some(roll) = ctx.state.strike(
            ctx.actor,
            target,
            self.multiplier,
            Self::ID,
            DamageType::Physical,
            &mut events,
        ) {
            if roll.dodged {
                result.messages.push(format!("{target} dodged"));
            } else {
                result.record_damage(target, roll.amount);
            }
        }
        ctx.events_mut().extend(events);

        let max = ctx.state.config.ultimate_max;
        if let Some(actor) = ctx.state.roster.get_mut(ctx.actor) {
            actor.add_ultimate_charge(self.charge_gain, max);
        }
        result
    }
}

/// Hits every requested enemy; needs a full ultimate gauge and empties it.
#[derive(Debug, Clone)]
pub struct Ultimate {
    pub multiplier: f64,
    pub cooldown: u32,
}

impl Ultimate {
    pub const ID: &'static str = "ultimate";
    pub const TAG: &'static str = "burst";
}

impl Default for Ultimate {
    fn default() -> Self {
        Self {
            multiplier: 2.5,
            cooldown: 2,
        }
    }
}

impl Ability for Ultimate {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn cooldown(&self) -> u32 {
        self.cooldown
    }

    fn cooldown_tags(&self) -> &[&'static str] {
        &[Self::TAG]
    }

    fn can_execute(&self, ctx: &ActionContext<'_>) -> bool {
        let max = ctx.state.config.ultimate_max;
        ctx.actor().is_some_and(|actor| actor.ultimate_ready(max))
            && !ctx.living_enemy_targets().is_empty()
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        if let Some(actor) = ctx.state.roster.get_mut(ctx.actor) {
            actor.ultimate_charge = 0;
        }

        let mut result = ActionResult::succeeded();
        let mut events = Vec::new();
        for target in ctx.living_enemy_targets() {
            let Some(roll) = ctx.state.strike(
                ctx.actor,
                target,
                self.multiplier,
                Self::ID,
                DamageType::Generic,
                &mut events,
            ) else {
                continue;
            };
            if !roll.dodged {
                result.record_damage(target, roll.amount);
            }
        }
        ctx.events_mut().extend(events);
        result
    }
}

/// Does nothing and ends the turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait;

impl Wait {
    pub const ID: &'static str = "wait";
}

impl Ability for Wait {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn cost(&self) -> u32 {
        0
    }

    fn ends_turn(&self) -> bool {
        true
    }

    fn can_execute(&self, _ctx: &ActionContext<'_>) -> bool {
        true
    }

    fn execute(&self, _ctx: &mut ActionContext<'_>) -> ActionResult {
        ActionResult::succeeded()
    }
}
