/// Battle configuration constants and tunable parameters.
///
/// Values are immutable for the lifetime of a battle and may be shared by
/// any number of concurrently running battles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Numerator of the queue baseline: `baseline = K / speed`.
    pub action_value_constant: f64,
    /// Action points granted at the start of every turn.
    pub action_points_per_turn: u32,
    /// Ultimate charge required (and retained at most).
    pub ultimate_max: u32,
    /// Defense value at which incoming damage is halved.
    pub defense_scale: f64,
    /// Enrage pressure tuning.
    pub enrage: EnrageConfig,
}

impl BattleConfig {
    // ===== compile-time constants =====
    pub const DEFAULT_ACTION_VALUE_CONSTANT: f64 = 10_000.0;
    pub const DEFAULT_ACTION_POINTS: u32 = 1;
    pub const DEFAULT_ULTIMATE_MAX: u32 = 15;
    pub const DEFAULT_DEFENSE_SCALE: f64 = 200.0;

    /// Smallest speed the queue accepts; slower values are raised to it.
    pub const MIN_SPEED: f64 = 1.0;
    /// Floor on the mitigation × vitality divisor.
    pub const MIN_DAMAGE_DIVISOR: f64 = 0.01;

    pub fn new() -> Self {
        Self {
            action_value_constant: Self::DEFAULT_ACTION_VALUE_CONSTANT,
            action_points_per_turn: Self::DEFAULT_ACTION_POINTS,
            ultimate_max: Self::DEFAULT_ULTIMATE_MAX,
            defense_scale: Self::DEFAULT_DEFENSE_SCALE,
            enrage: EnrageConfig::default(),
        }
    }

    pub fn with_enrage(mut self, enrage: EnrageConfig) -> Self {
        self.enrage = enrage;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tuning for the enrage controller.
///
/// The activation threshold grows with the number of foes so that larger
/// encounters get proportionally more time before pressure starts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnrageConfig {
    /// Turn count after which a single-foe battle enrages.
    pub base_threshold: u32,
    /// Extra turns granted per foe.
    pub per_foe_threshold: u32,
    /// Upper bound on the derived threshold.
    pub max_threshold: u32,
    /// Foe attack multiplier added per enrage stack (0.05 = +5%).
    pub atk_per_stack: f64,
    /// Stack count after which the party starts bleeding.
    pub bleed_after_stacks: u32,
    /// Turns between bleed applications once bleeding started.
    pub bleed_interval: u32,
    /// Bleed damage per tick as a fraction of the victim's max HP.
    pub bleed_fraction: f64,
    /// Duration of each bleed instance.
    pub bleed_turns: u32,
    /// Concurrent bleed instances allowed per party member.
    pub bleed_max_stacks: u32,
    /// Hard limit on turns; reaching it ends the battle in defeat.
    pub max_turns: u32,
}

impl Default for EnrageConfig {
    fn default() -> Self {
        Self {
            base_threshold: 100,
            per_foe_threshold: 20,
            max_threshold: 200,
            atk_per_stack: 0.05,
            bleed_after_stacks: 20,
            bleed_interval: 5,
            bleed_fraction: 0.02,
            bleed_turns: 3,
            bleed_max_stacks: 5,
            max_turns: 2_000,
        }
    }
}
