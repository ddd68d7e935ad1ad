/// Which collection an effect belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EffectCategory {
    Modifier,
    Dot,
    Hot,
}

/// What happened to an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NoticeKind {
    /// Newly added.
    Applied,
    /// Replaced an existing instance with the same identity.
    Refreshed,
    /// A periodic effect dealt damage or healing.
    Ticked,
    /// Expired or was removed.
    Removed,
}

impl NoticeKind {
    /// True for notices published as `effect_removed`.
    pub const fn is_removal(self) -> bool {
        matches!(self, NoticeKind::Removed)
    }
}

/// Observable change to a combatant's effects.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectNotice {
    pub kind: NoticeKind,
    pub category: EffectCategory,
    pub name: String,
    /// Damage or healing dealt by a tick, magnitude on application.
    pub amount: Option<i64>,
    /// Turns left after this change (`None` for permanent effects).
    pub remaining: Option<u32>,
}

impl EffectNotice {
    pub fn new(kind: NoticeKind, category: EffectCategory, name: impl Into<String>) -> Self {
        Self {
            kind,
            category,
            name: name.into(),
            amount: None,
            remaining: None,
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_remaining(mut self, remaining: Option<u32>) -> Self {
        self.remaining = remaining;
        self
    }
}

/// Compact description of one active effect for UI/progress snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSummary {
    pub name: String,
    pub category: EffectCategory,
    pub stacks: u32,
    /// Longest remaining duration across stacks.
    pub remaining: Option<u32>,
}
