//! Ledger Anomaly CLI: score a JSON batch of transactions against the trained
//! model, or print model metadata. Results go to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_anomaly::{
    config::AppConfig,
    logging::StructuredLogger,
    model::{ModelLoader, ScorerHandle},
    service::{ErrorResponse, ScoringService},
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ledger-anomaly", version, about = "Score transaction batches for anomalies")]
struct Cli {
    /// Config file (defaults to $LEDGER_ANOMALY_CONFIG or config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a batch: `{"transactions": [...]}` or a bare array. `-` reads stdin.
    Score { input: PathBuf },
    /// Show model availability, threshold and required fields.
    Meta,
}

fn read_payload(input: &Path) -> Result<serde_json::Value> {
    let text = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read batch from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read batch file {}", input.display()))?
    };
    serde_json::from_str(&text).context("batch is not valid JSON")
}

fn emit(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        StructuredLogger::emit_pretty(value, &mut stdout)?;
    } else {
        StructuredLogger::emit_json(value, &mut stdout)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::try_load(&config_path)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("invalid config {}", config_path.display()))?
        .unwrap_or_default();

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "ledger-anomaly starting");

    let model = ModelLoader::new(&config)
        .load()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to load anomaly model")?;
    let handle = Arc::new(match model {
        Some(model) => ScorerHandle::with_model(model),
        None => ScorerHandle::empty(),
    });
    let service = ScoringService::new(handle, config.limits.clone());

    match cli.command {
        Command::Meta => emit(&service.meta(), cli.pretty),
        Command::Score { input } => {
            let payload = read_payload(&input)?;
            match service.score(&payload) {
                Ok(response) => emit(&response, cli.pretty),
                Err(e) => {
                    emit(&ErrorResponse::from(&e), cli.pretty)?;
                    std::process::exit(match e.status_code() {
                        503 => 3,
                        500 => 4,
                        _ => 2,
                    });
                }
            }
        }
    }
}
