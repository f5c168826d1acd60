//! Progress callbacks for long-running digest runs.

use crate::pipeline::DigestReport;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a topic has been searched and filtered.
    fn topic_searched(&self, topic: &str, hits: usize, relevant: usize);
    /// Called once per relevant hit, in order, after its fetch finished.
    fn page_acquired(&self, url: &str, ok: bool, current: usize, total: usize);
    /// Called once per acquired page, in order, after its summary finished.
    fn page_summarized(&self, url: &str, ok: bool, current: usize, total: usize);
    /// Called after each critique.
    fn review_round(&self, round: u32, approved: bool);
    /// Called when the run completes.
    fn done(&self, report: &DigestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn topic_searched(&self, _topic: &str, _hits: usize, _relevant: usize) {}
    fn page_acquired(&self, _url: &str, _ok: bool, _current: usize, _total: usize) {}
    fn page_summarized(&self, _url: &str, _ok: bool, _current: usize, _total: usize) {}
    fn review_round(&self, _round: u32, _approved: bool) {}
    fn done(&self, _report: &DigestReport) {}
}
