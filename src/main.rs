use anyhow::Result;
use clap::Parser;
use emission_flex::{config, runner, telemetry};
use config::Config;
use runner::{RunOptions, Runner};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use telemetry::init_tracing;
use tracing::{info, warn};

use emission_flex::domain::{Scenario, Sector};

/// Estimate the emissions saved by shifting or shedding end-use load
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML config file, defaults to config/default.toml
    #[arg(short, long, env = "EFLEX_CONFIG")]
    config: Option<PathBuf>,

    /// Sectors to run (repeatable); all when omitted
    #[arg(long = "sector", value_parser = parse_sector)]
    sectors: Vec<Sector>,

    /// Scenarios to run (repeatable); all when omitted
    #[arg(long = "scenario", value_parser = parse_scenario)]
    scenarios: Vec<Scenario>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Solve and log totals without writing tables
    #[arg(long)]
    dry_run: bool,
}

fn parse_sector(raw: &str) -> Result<Sector, String> {
    raw.parse().map_err(|_| format!("unknown sector '{raw}'"))
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    raw.parse().map_err(|_| format!("unknown scenario '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let cfg = Config::load(cli.config.as_deref())?;
    info!(
        data_dir = %cfg.data.data_dir.display(),
        out_dir = %cfg.data.out_dir.display(),
        "starting emission-flex"
    );

    let options = RunOptions {
        sectors: if cli.sectors.is_empty() { Sector::iter().collect() } else { cli.sectors },
        scenarios: if cli.scenarios.is_empty() { Scenario::iter().collect() } else { cli.scenarios },
        dry_run: cli.dry_run,
    };

    let summary = Runner::new(&cfg).run(&options).await;
    for report in &summary.sectors {
        for path in &report.written {
            info!(sector = %report.sector, path = %path.display(), "table written");
        }
    }

    if !summary.aborted.is_empty() {
        let sectors: Vec<String> = summary.aborted.iter().map(|(s, _)| s.to_string()).collect();
        anyhow::bail!("aborted sectors: {}", sectors.join(", "));
    }
    if summary.failed_cells() > 0 {
        warn!(cells = summary.failed_cells(), "run finished with unsolved cells");
    }
    Ok(())
}
