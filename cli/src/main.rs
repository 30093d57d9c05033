mod replay;

use std::path::PathBuf;

use clap::Parser;

use crate::replay::{Report, ReplayError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dropkit-replay", about = "Replay a scripted drag session and print its lifecycle events")]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Print the full report as JSON instead of one line per event.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Override the scenario's strategy (`closest-center`,
    /// `rectangle-intersection`, `closest-corner[:sum|min|average]`).
    #[arg(long, env = "DROPKIT_STRATEGY")]
    strategy: Option<dropkit::StrategyKind>,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut scenario = replay::load(&cli.scenario)?;
    if let Some(strategy) = cli.strategy {
        scenario.config.strategy = strategy;
    }

    let report = replay::replay(&scenario)?;
    if cli.json {
        print_json(&report)?;
    } else {
        print_text(&report);
    }
    Ok(())
}

fn print_json(report: &Report) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_text(report: &Report) {
    for entry in &report.events {
        println!("{entry}");
    }
    let label = |id: &Option<String>| id.clone().unwrap_or_else(|| "-".to_owned());
    println!(
        "phase={:?} dragging={} dropping={} overlay=({}, {})",
        report.phase,
        label(&report.dragging),
        label(&report.dropping),
        report.overlay.x,
        report.overlay.y
    );
}
