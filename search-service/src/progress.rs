//! Lightweight progress reporting for batch ingestion.
//!
//! Use `NoopProgress` for library callers and tests, `IndicatifProgress` for
//! the CLI.

use indicatif::{ProgressBar, ProgressStyle};

/// Minimal progress interface used by `ingest_folder`.
pub trait Progress: Send + Sync {
    /// Set known total steps.
    fn set_total(&self, _n: u64) {}
    /// Advance by one step and show a short message.
    fn step(&self, _msg: &str) {}
    /// Finish the UI.
    fn finish(&self, _msg: &str) {}
}

/// No-op reporter for headless runs.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif bar, one step per file.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    /// Bounded bar; the length may be set later with [`Progress::set_total`].
    pub fn bar(len: u64) -> Self {
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }
    fn step(&self, msg: &str) {
        self.pb.inc(1);
        self.pb.set_message(msg.to_string());
    }
    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
