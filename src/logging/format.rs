//! Diagnostics go through `tracing` to stderr; responses are written as JSON
//! lines (one object per line) so stdout stays machine-readable.

use crate::error::panic_message;
use serde::Serialize;
use std::io::Write;
use tracing::error;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr, level from RUST_LOG or `default_level`.
    pub fn init(json: bool, default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        Self::install_panic_hook();
    }

    /// Report panics as `error!` events instead of the default stderr text, so
    /// panics caught at the prediction boundaries keep the log stream parseable.
    pub fn install_panic_hook() {
        std::panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            error!(
                panic = %panic_message(info.payload()),
                location = %location,
                "panic"
            );
        }));
    }

    /// Write one value as a single JSON line.
    pub fn emit_json(value: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(value)?;
        writeln!(w, "{}", line)
    }
}
