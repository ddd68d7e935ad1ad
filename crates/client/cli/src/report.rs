//! Console output and result export.
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use battle_core::Side;
use battle_runtime::{BattleResult, BattleSnapshot};
use tokio::sync::broadcast::{self, error::RecvError};

/// One status line per snapshot: turn, phase and every combatant's HP.
pub fn format_snapshot(snapshot: &BattleSnapshot) -> String {
    let mut line = format!("turn {:>4} [{:<12}]", snapshot.turn, snapshot.phase.to_string());
    for side in [Side::Party, Side::Foe] {
        line.push_str(" |");
        for c in snapshot.combatants.iter().filter(|c| c.side == side) {
            let _ = write!(line, " {} {}/{}", c.name, c.hp, c.max_hp);
            if c.shields > 0 {
                let _ = write!(line, "+{}", c.shields);
            }
        }
    }
    if snapshot.enrage.active {
        let _ = write!(line, " | enrage x{}", snapshot.enrage.stacks);
    }
    line
}

/// Prints snapshots until the battle drops its sender.
pub async fn print_progress(mut rx: broadcast::Receiver<BattleSnapshot>) {
    loop {
        match rx.recv().await {
            Ok(snapshot) => println!("{}", format_snapshot(&snapshot)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress printer lagging");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

pub fn summary(result: &BattleResult) -> String {
    let mut out = format!(
        "{} after {} turns, {} foe(s) defeated",
        result.outcome,
        result.turns,
        result.defeated_foes.len()
    );
    for member in &result.party.members {
        let _ = write!(out, "\n  {:<8} {:>5}/{}", member.name, member.hp(), member.max_hp());
    }
    if result.enrage.active {
        let _ = write!(out, "\n  enrage reached {} stack(s)", result.enrage.stacks);
    }
    out
}

pub fn write_result(path: &Path, result: &BattleResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write battle result: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{BaseStats, Combatant, CombatantId, EnrageState};
    use battle_runtime::{Outcome, Party};
    use tempfile::TempDir;

    fn result() -> BattleResult {
        BattleResult {
            outcome: Outcome::Victory,
            party: Party::new(vec![Combatant::new(
                CombatantId(1),
                "Knight",
                Side::Party,
                BaseStats::new(),
            )]),
            turns: 12,
            defeated_foes: vec![CombatantId(100)],
            enrage: EnrageState::default(),
        }
    }

    #[test]
    fn summary_lists_outcome_and_members() {
        let text = summary(&result());
        assert!(text.starts_with("victory after 12 turns, 1 foe(s) defeated"));
        assert!(text.contains("Knight"));
        assert!(!text.contains("enrage"));
    }

    #[test]
    fn result_is_written_as_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("result.json");

        write_result(&path, &result()).unwrap();

        let written: BattleResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, result());
    }
}
