//! Contracts between the pipeline core and its external collaborators.
//!
//! The core only ever sees these traits. Concrete implementations live in
//! the `search`, `crawler`, `llm` and `mailer` crates and are wired together
//! by the CLI.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CritiqueReply, DraftReply, NormalizedPage, PageSummary, Recipient, RelevanceVerdict,
    ReviewMessage, SearchHit,
};

/// Web search: one bounded, time-windowed round per query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search. Hits carry 1-based ids in result order.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Fetches a page and normalizes it to text.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_and_normalize(&self, url: &str) -> Result<NormalizedPage>;
}

/// Judges which of a topic's hits are relevant to it.
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    async fn judge(&self, topic: &str, hits: &[SearchHit]) -> Result<Vec<RelevanceVerdict>>;
}

/// Condenses one (already truncated) page text into a summary.
#[async_trait]
pub trait Condenser: Send + Sync {
    async fn condense(&self, text: &str) -> Result<String>;
}

/// Composes or revises the consolidated digest.
///
/// The drafter is the only role that sees the page summaries directly.
#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(
        &self,
        history: &[ReviewMessage],
        summaries: &[PageSummary],
    ) -> Result<DraftReply>;
}

/// Approves the latest draft or asks for a revision, from the history alone.
#[async_trait]
pub trait Critic: Send + Sync {
    async fn critique(&self, history: &[ReviewMessage]) -> Result<CritiqueReply>;
}

/// Delivers the approved digest.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<()>;
}
