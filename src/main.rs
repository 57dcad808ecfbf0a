//! student-risk entrypoint: runs predictions over JSON lines and serves the
//! history reports built from past predictions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use student_risk::{
    config::ServiceConfig,
    error::PredictionFailure,
    features::StudentObservation,
    logging::StructuredLogger,
    model::load_model,
    risk::{PredictionResult, RiskEngine},
    storage::HistoryStore,
};
use tracing::{info, warn};

/// Academic risk prediction
#[derive(Parser)]
#[command(name = "student-risk")]
#[command(author, version, about = "Predict, explain and track student academic risk", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, env = "STUDENT_RISK_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict risk for newline-delimited student observations
    Predict {
        /// Read observations from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Risk trajectory of one student
    History { student_id: String },

    /// Risk counts and top high-risk students per cohort
    CohortStats,

    /// Overall counts, top high-risk students and average confidence
    Summary,

    /// Export history rows as CSV
    Export {
        /// Only students whose id starts with this prefix
        #[arg(long)]
        cohort: Option<String>,
    },

    /// Export one student's history as CSV
    Report { student_id: String },

    /// Record an alert sent to a student
    Alert {
        student_id: String,
        message: String,
        #[arg(long, default_value = "manual")]
        method: String,
    },
}

fn open_store(config: &ServiceConfig) -> Result<HistoryStore> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    let path = config.history_path();
    HistoryStore::open(&path).with_context(|| format!("opening {}", path.display()))
}

fn run_predictions(config: &ServiceConfig, input: Option<PathBuf>) -> Result<()> {
    let loaded = load_model(&config.model).context("loading model")?;
    let mut engine = RiskEngine::from_loaded(loaded);

    if config.store.enabled {
        match open_store(config) {
            Ok(store) => engine = engine.with_sink(Arc::new(store)),
            Err(e) => warn!(error = %format!("{:#}", e), "history store unavailable; predictions will not be recorded"),
        }
    }

    let reader: Box<dyn BufRead> = match &input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (mut ok, mut failed) = (0u64, 0u64);

    for (n, line) in reader.split(b'\n').enumerate() {
        let mut line = line.context("reading input")?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let written = match respond(&engine, n + 1, &line) {
            Some(Ok(result)) => {
                ok += 1;
                StructuredLogger::emit_json(&result, &mut out)
            }
            Some(Err(failure)) => {
                failed += 1;
                StructuredLogger::emit_json(&failure, &mut out)
            }
            None => continue,
        };
        written.context("writing response")?;
    }
    out.flush()?;

    info!(ok, failed, "predictions complete");
    Ok(())
}

/// One input line → one response. `None` for blank lines.
fn respond(
    engine: &RiskEngine,
    line_no: usize,
    raw: &[u8],
) -> Option<Result<PredictionResult, PredictionFailure>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            warn!(line = line_no, error = %e, "input line is not valid UTF-8");
            return Some(Err(PredictionFailure::invalid_input(e.to_string())));
        }
    };
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<StudentObservation>(text) {
        Ok(obs) => Some(engine.handle(&obs)),
        Err(e) => {
            warn!(line = line_no, error = %e, "invalid observation");
            Some(Err(PredictionFailure::invalid_input(e.to_string())))
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let mut out = std::io::stdout().lock();
    StructuredLogger::emit_json(value, &mut out)?;
    Ok(())
}

fn print_csv(csv: Option<String>) -> Result<()> {
    match csv {
        Some(body) => std::io::stdout().lock().write_all(body.as_bytes())?,
        None => info!("no history rows matched"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli.config);

    StructuredLogger::init(config.log.json, &config.log.level);

    match cli.command {
        Command::Predict { input } => run_predictions(&config, input),
        Command::History { student_id } => print_json(&open_store(&config)?.student_history(&student_id)?),
        Command::CohortStats => print_json(&open_store(&config)?.cohort_stats()?),
        Command::Summary => print_json(&open_store(&config)?.teacher_summary()?),
        Command::Export { cohort } => print_csv(open_store(&config)?.cohort_export(cohort.as_deref())?),
        Command::Report { student_id } => print_csv(open_store(&config)?.student_report(&student_id)?),
        Command::Alert {
            student_id,
            message,
            method,
        } => {
            let alert = open_store(&config)?.record_alert(&student_id, &message, &method, "sent")?;
            info!(student_id = %alert.student_id, method = %alert.method, "alert recorded");
            print_json(&serde_json::json!({ "status": "ok", "student_id": alert.student_id }))
        }
    }
}
