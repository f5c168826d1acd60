//! Spinner-based progress output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use lunathink_core::{DigestReport, ProgressReporter};

/// CLI progress reporter using an indicatif spinner.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Stop the spinner without a final report (the run failed).
    pub(crate) fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn topic_searched(&self, topic: &str, hits: usize, relevant: usize) {
        self.spinner
            .println(format!("  {topic}: {relevant} of {hits} results relevant"));
    }

    fn page_acquired(&self, url: &str, ok: bool, current: usize, total: usize) {
        let mark = if ok { "" } else { " (failed)" };
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}{mark}"));
    }

    fn page_summarized(&self, url: &str, ok: bool, current: usize, total: usize) {
        let mark = if ok { "" } else { " (skipped)" };
        self.spinner
            .set_message(format!("Summarizing [{current}/{total}] {url}{mark}"));
    }

    fn review_round(&self, round: u32, approved: bool) {
        let verdict = if approved { "approved" } else { "revision requested" };
        self.spinner.println(format!("  review round {round}: {verdict}"));
        if !approved {
            self.spinner.set_message(format!("Revising digest (round {})", round + 1));
        }
    }

    fn done(&self, _report: &DigestReport) {
        self.spinner.finish_and_clear();
    }
}
