//! Glue code tying the battle session, console output and signals together.
use anyhow::{Context, Result};
use battle_runtime::{BattleError, BattleSession, EventKind, HandlerCriticality};
use strum::IntoEnumIterator;
use tokio::sync::{broadcast, watch};

use crate::config::SimConfig;
use crate::{encounter, report};

const PROGRESS_BUFFER: usize = 64;

pub async fn run(config: SimConfig) -> Result<()> {
    tracing::info!(
        seed = config.seed,
        foes = config.foes,
        relics = ?config.relics,
        cards = ?config.cards,
        "Battle simulator starting"
    );

    let (progress_tx, progress_rx) = broadcast::channel(PROGRESS_BUFFER);
    let party = encounter::party(&config);
    let mut session = BattleSession::builder(party, encounter::foes(config.foes))
        .config(config.runtime())
        .progress(progress_tx)
        .build()
        .context("Failed to set up battle")?;

    // Mirror the event stream into the log file
    for kind in EventKind::iter() {
        session.subscribe_fn(kind, "event-log", HandlerCriticality::Optional, |event, _| {
            tracing::debug!(target: "battle_cli::events", ?event);
            Ok(())
        });
    }

    let printer = tokio::spawn(report::print_progress(progress_rx));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling battle");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = session.run_until_cancelled(cancel_rx).await;
    // The session dropped its progress sender, so the printer drains and exits
    let _ = printer.await;

    let result = match outcome {
        Ok(result) => result,
        Err(BattleError::Cancelled) => {
            println!("battle cancelled");
            return Ok(());
        }
        Err(err) => {
            tracing::error!(error = %err, "Battle aborted");
            return Err(err).context("Battle aborted");
        }
    };

    println!("{}", report::summary(&result));
    if let Some(path) = &config.result_path {
        report::write_result(path, &result)?;
        println!("result written to {}", path.display());
    }

    tracing::info!(outcome = %result.outcome, turns = result.turns, "Battle simulator exiting");
    Ok(())
}
