//! Log lines go to stderr (JSON or human-readable); results go to stdout as
//! one JSON document per line.

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber. `RUST_LOG` overrides `default_level`.
    /// Calling it twice is harmless; the second call is ignored.
    pub fn init(json: bool, default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let result = if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }

    /// Write `event` as a single JSON line.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)
    }

    /// Pretty-printed variant for interactive use.
    pub fn emit_pretty(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(event)?;
        writeln!(w, "{}", text)
    }
}
