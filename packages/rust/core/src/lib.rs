//! Digest pipeline and review workflow for Lunathink.
//!
//! This crate drives a run end to end (`run_digest`) against the
//! collaborator traits from `lunathink-shared`; it never talks to the
//! network itself.

pub mod acquisition;
pub mod pipeline;
pub mod progress;
pub mod relevance;
pub mod review;
pub mod summarizer;
mod workers;

#[cfg(test)]
mod testing;

pub use pipeline::{Collaborators, DigestReport, DigestRequest, run_digest};
pub use progress::{ProgressReporter, SilentProgress};
pub use review::{ReviewOutcome, ReviewPhase, ReviewState, ReviewWorkflow};
