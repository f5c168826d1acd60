//! End-to-end digest run: topics → search → relevance → acquire → summarize
//! → review → deliver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use lunathink_shared::{
    Condenser, ContentSource, Critic, Dispatcher, Drafter, LunathinkError, Recipient,
    RelevanceJudge, Result, RunId, RunSettings, SearchHit, SearchProvider, Stage,
};

use crate::acquisition;
use crate::progress::ProgressReporter;
use crate::relevance;
use crate::review::ReviewWorkflow;
use crate::summarizer;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A validated request for one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRequest {
    topics: Vec<String>,
    recipient: Recipient,
}

impl DigestRequest {
    /// Trims topics and drops blank ones; rejects an empty topic list, an
    /// empty name and an email without `@`.
    pub fn new<I, S>(topics: I, name: &str, email: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(LunathinkError::validation("at least one topic is required"));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(LunathinkError::validation("recipient name is required"));
        }

        let email = email.trim();
        if !email.contains('@') {
            return Err(LunathinkError::validation(format!(
                "'{email}' is not a valid email address"
            )));
        }

        Ok(Self {
            topics,
            recipient: Recipient {
                name: name.to_string(),
                email: email.to_string(),
            },
        })
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }
}

// ---------------------------------------------------------------------------
// Collaborators & report
// ---------------------------------------------------------------------------

/// Every external collaborator a run needs.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchProvider>,
    pub content: Arc<dyn ContentSource>,
    pub judge: Arc<dyn RelevanceJudge>,
    pub condenser: Arc<dyn Condenser>,
    pub drafter: Arc<dyn Drafter>,
    pub critic: Arc<dyn Critic>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct DigestReport {
    pub run_id: RunId,
    pub delivered: bool,
    pub topics: usize,
    pub hits_found: usize,
    pub hits_relevant: usize,
    pub pages_acquired: usize,
    pub pages_summarized: usize,
    pub review_rounds: u32,
    /// False when the last draft was force-accepted at the review cap.
    pub approved: bool,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the full digest pipeline for one request.
///
/// 1. Search each topic and filter its hits for relevance
/// 2. Acquire the relevant pages (best-effort)
/// 3. Summarize the acquired pages (best-effort)
/// 4. Review until the critic approves
/// 5. Deliver the digest
#[instrument(skip_all, fields(topics = request.topics().len(), to = %request.recipient().email))]
pub async fn run_digest(
    request: &DigestRequest,
    collaborators: &Collaborators,
    settings: &RunSettings,
    progress: &dyn ProgressReporter,
) -> Result<DigestReport> {
    settings.validate()?;

    let start = Instant::now();
    let run_id = RunId::new();
    let concurrency = settings.concurrency as usize;
    info!(%run_id, "starting digest run");

    // --- Phase 1: Search & relevance ---
    progress.phase("Searching topics");
    let mut hits_found = 0;
    let mut relevant: Vec<SearchHit> = Vec::new();

    for topic in request.topics() {
        let hits = collaborators
            .search
            .search(topic)
            .await
            .map_err(|e| e.at_stage(Stage::Search))?;
        let found = hits.len();
        hits_found += found;

        let kept = relevance::filter(collaborators.judge.as_ref(), topic, hits).await?;
        progress.topic_searched(topic, found, kept.len());
        info!(topic = %topic, hits = found, relevant = kept.len(), "topic processed");
        relevant.extend(kept);
    }
    let hits_relevant = relevant.len();

    // --- Phase 2: Acquisition ---
    progress.phase("Fetching pages");
    let pages: Vec<_> = acquisition::acquire_all(
        Arc::clone(&collaborators.content),
        relevant,
        concurrency,
        progress,
    )
    .await
    .into_iter()
    .flatten()
    .collect();
    let pages_acquired = pages.len();

    // --- Phase 3: Summarization ---
    progress.phase("Summarizing pages");
    let summaries: Vec<_> = summarizer::summarize_all(
        Arc::clone(&collaborators.condenser),
        pages,
        settings.max_words,
        concurrency,
        progress,
    )
    .await
    .into_iter()
    .flatten()
    .collect();
    let pages_summarized = summaries.len();

    // --- Phase 4: Review ---
    progress.phase("Drafting digest");
    let workflow = ReviewWorkflow::new(
        Arc::clone(&collaborators.drafter),
        Arc::clone(&collaborators.critic),
        settings.review.clone(),
    );
    let outcome = workflow.run(summaries, progress).await?;

    // --- Phase 5: Delivery ---
    progress.phase("Sending digest");
    collaborators
        .dispatcher
        .send(request.recipient(), &outcome.text)
        .await
        .map_err(|e| e.at_stage(Stage::Delivery))?;

    let report = DigestReport {
        run_id,
        delivered: true,
        topics: request.topics().len(),
        hits_found,
        hits_relevant,
        pages_acquired,
        pages_summarized,
        review_rounds: outcome.rounds,
        approved: outcome.approved,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %report.run_id,
        hits = report.hits_found,
        relevant = report.hits_relevant,
        acquired = report.pages_acquired,
        summarized = report.pages_summarized,
        rounds = report.review_rounds,
        approved = report.approved,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "digest delivered"
    );
    progress.done(&report);
    Ok(report)
}
