use crate::combat::DamageFlags;

/// Current HP and shield pool of a combatant.
///
/// `Vitals` never knows its own maximum; callers pass the effective max HP
/// so the clamp always reflects active modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vitals {
    pub hp: i64,
    pub shields: i64,
}

/// Result of routing damage through shields into HP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageApplied {
    /// Damage soaked by shields.
    pub absorbed: i64,
    /// HP actually lost.
    pub hp_lost: i64,
}

impl DamageApplied {
    pub fn total(&self) -> i64 {
        self.absorbed + self.hp_lost
    }
}

impl Vitals {
    pub fn new(hp: i64) -> Self {
        Self { hp, shields: 0 }
    }

    /// Applies damage, drawing from shields first unless the damage is cost
    /// damage. HP never drops below zero.
    pub fn absorb(&mut self, amount: i64, flags: DamageFlags) -> DamageApplied {
        let amount = amount.max(0);
        let absorbed = if flags.contains(DamageFlags::COST) {
            0
        } else {
            amount.min(self.shields)
        };
        self.shields -= absorbed;

        let remaining = amount - absorbed;
        let hp_lost = remaining.min(self.hp.max(0));
        self.hp = (self.hp - remaining).max(0);

        DamageApplied { absorbed, hp_lost }
    }

    /// Restores HP up to `max_hp`; returns the amount actually healed.
    pub fn restore(&mut self, amount: i64, max_hp: i64) -> i64 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).clamp(0, max_hp.max(0));
        self.hp - before
    }

    pub fn clamp(&mut self, max_hp: i64) {
        self.hp = self.hp.clamp(0, max_hp.max(0));
    }
}
