//! Simulator configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use battle_runtime::RuntimeConfig;

/// Configuration for one simulated battle.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub seed: u64,
    pub turn_timeout: Duration,
    pub foes: usize,
    pub relics: Vec<String>,
    pub cards: Vec<String>,
    pub session_id: Option<String>,
    pub log_dir: Option<PathBuf>,
    /// Where to write the JSON battle result, if anywhere.
    pub result_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            turn_timeout: RuntimeConfig::DEFAULT_TURN_TIMEOUT,
            foes: 2,
            relics: vec!["lifesteal".to_string()],
            cards: vec!["momentum".to_string()],
            session_id: None,
            log_dir: None,
            result_path: None,
        }
    }
}

impl SimConfig {
    pub const MAX_FOES: usize = 8;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_SEED` - RNG seed (default: 0)
    /// - `BATTLE_TURN_TIMEOUT_MS` - Per-turn watchdog (default: 30000)
    /// - `BATTLE_FOES` - Number of foes, 1 to 8 (default: 2)
    /// - `BATTLE_RELICS` - Comma-separated relic ids (default: lifesteal)
    /// - `BATTLE_CARDS` - Comma-separated card ids (default: momentum)
    /// - `BATTLE_SESSION_ID` - Log session name (default: timestamp)
    /// - `BATTLE_LOG_DIR` - Log directory (default: platform cache dir)
    /// - `BATTLE_RESULT_PATH` - Write the battle result as JSON here
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parse = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());

        if let Some(seed) = parse("BATTLE_SEED") {
            config.seed = seed;
        }
        if let Some(ms) = parse("BATTLE_TURN_TIMEOUT_MS") {
            config.turn_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(foes) = parse("BATTLE_FOES") {
            config.foes = usize::try_from(foes)
                .unwrap_or(Self::MAX_FOES)
                .clamp(1, Self::MAX_FOES);
        }
        if let Some(relics) = lookup("BATTLE_RELICS") {
            config.relics = split_ids(&relics);
        }
        if let Some(cards) = lookup("BATTLE_CARDS") {
            config.cards = split_ids(&cards);
        }

        config.session_id = lookup("BATTLE_SESSION_ID");
        config.log_dir = lookup("BATTLE_LOG_DIR").map(PathBuf::from);
        config.result_path = lookup("BATTLE_RESULT_PATH").map(PathBuf::from);

        config
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_seed(self.seed)
            .with_turn_timeout(self.turn_timeout)
    }
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
