//! Logging setup shared by the workspace binaries.
//!
//! Libraries only emit `tracing` events; the binary calls [`init`] once to
//! install a global subscriber with RFC3339 timestamps and an `EnvFilter`
//! (`RUST_LOG` wins over the supplied default).

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Workspace crates whose targets get the per-crate level directive.
pub const WORKSPACE_TARGETS: &[&str] = &["ai_llm_service", "rag_store", "search_service"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Builds a level directive for one target, e.g. `rag_store=debug`.
///
/// # Errors
/// Returns [`ParseError`] if `target` is not a valid directive target.
pub fn level_directive(target: &str, level: Level) -> Result<Directive, ParseError> {
    format!("{target}={}", level.as_str().to_lowercase()).parse()
}

/// `EnvFilter` from `RUST_LOG`, or `default` when unset/invalid, with
/// `level` applied to every workspace crate.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    for target in WORKSPACE_TARGETS {
        if let Ok(d) = level_directive(target, level) {
            filter = filter.add_directive(d);
        }
    }
    filter
}

/// Installs the global subscriber: compact single-line format, RFC3339 UTC
/// timestamps, targets shown, ANSI colors only on a terminal.
///
/// # Errors
/// Returns [`TryInitError`] if a global subscriber is already set.
pub fn init(default: &str, level: Level) -> Result<(), TryInitError> {
    let use_ansi = io::stdout().is_terminal();

    let fmt_layer = fmt::layer()
        .compact()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(use_ansi);

    tracing_subscriber::registry()
        .with(env_filter_with_level(default, level))
        .with(fmt_layer)
        .try_init()
}
