//! The Drafter/Critic review loop.
//!
//! A two-state machine: `Drafting` appends exactly one draft, `Critiquing`
//! appends exactly one piece of feedback and either approves or sends the
//! run back to `Drafting`. The conversation is append-only and owned by a
//! single [`ReviewState`] for the lifetime of the run. Rounds are capped by
//! [`ReviewConfig::max_rounds`]; what happens at the cap is decided by
//! [`ExhaustionPolicy`].

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use lunathink_shared::{
    Critic, DraftReply, Drafter, ExhaustionPolicy, LunathinkError, PageSummary, Result,
    ReviewConfig, ReviewMessage, Stage,
};

use crate::progress::ProgressReporter;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    Drafting,
    Critiquing,
    Approved,
}

/// Conversation and inputs of one review run.
#[derive(Debug)]
pub struct ReviewState {
    messages: Vec<ReviewMessage>,
    page_summaries: Vec<PageSummary>,
    approved: bool,
    latest_draft: String,
}

impl ReviewState {
    pub fn new(page_summaries: Vec<PageSummary>) -> Self {
        Self {
            messages: Vec::new(),
            page_summaries,
            approved: false,
            latest_draft: String::new(),
        }
    }

    /// Append a message. Drafts also become the latest draft.
    pub fn push(&mut self, message: ReviewMessage) {
        if let ReviewMessage::Draft { text, .. } = &message {
            self.latest_draft = text.clone();
        }
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ReviewMessage] {
        &self.messages
    }

    pub fn page_summaries(&self) -> &[PageSummary] {
        &self.page_summaries
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn latest_draft(&self) -> &str {
        &self.latest_draft
    }

    fn approve(&mut self) {
        self.approved = true;
    }

    fn into_outcome(self, rounds: u32) -> ReviewOutcome {
        ReviewOutcome {
            text: self.latest_draft,
            rounds,
            approved: self.approved,
            transcript: self.messages,
        }
    }
}

/// Result of a finished review.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The final draft.
    pub text: String,
    /// Number of drafting steps taken.
    pub rounds: u32,
    /// False only when the last draft was force-accepted at the cap.
    pub approved: bool,
    pub transcript: Vec<ReviewMessage>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct ReviewWorkflow {
    drafter: Arc<dyn Drafter>,
    critic: Arc<dyn Critic>,
    config: ReviewConfig,
}

impl ReviewWorkflow {
    pub fn new(drafter: Arc<dyn Drafter>, critic: Arc<dyn Critic>, config: ReviewConfig) -> Self {
        Self {
            drafter,
            critic,
            config,
        }
    }

    #[instrument(skip_all, fields(summaries = page_summaries.len(), max_rounds = self.config.max_rounds))]
    pub async fn run(
        &self,
        page_summaries: Vec<PageSummary>,
        progress: &dyn ProgressReporter,
    ) -> Result<ReviewOutcome> {
        if self.config.max_rounds == 0 {
            return Err(LunathinkError::validation("review.max_rounds must be at least 1"));
        }

        let mut state = ReviewState::new(page_summaries);
        let mut phase = ReviewPhase::Drafting;
        let mut rounds: u32 = 0;

        while phase != ReviewPhase::Approved {
            phase = match phase {
                ReviewPhase::Drafting => {
                    rounds += 1;
                    let DraftReply { text, note } = self
                        .drafter
                        .draft(state.messages(), state.page_summaries())
                        .await
                        .map_err(|e| e.at_stage(Stage::Drafting))?;
                    debug!(round = rounds, chars = text.len(), "draft produced");
                    state.push(ReviewMessage::Draft { text, note });
                    ReviewPhase::Critiquing
                }
                ReviewPhase::Critiquing => {
                    let reply = self
                        .critic
                        .critique(state.messages())
                        .await
                        .map_err(|e| e.at_stage(Stage::Critique))?;
                    state.push(ReviewMessage::Feedback {
                        text: reply.feedback,
                    });
                    progress.review_round(rounds, reply.approved);

                    if reply.approved {
                        state.approve();
                        ReviewPhase::Approved
                    } else if rounds >= self.config.max_rounds {
                        match self.config.on_exhausted {
                            ExhaustionPolicy::Fail => {
                                return Err(LunathinkError::NotConverged { rounds });
                            }
                            ExhaustionPolicy::AcceptLast => {
                                warn!(rounds, "review cap reached, accepting last draft");
                                break;
                            }
                        }
                    } else {
                        debug!(round = rounds, "revision requested");
                        ReviewPhase::Drafting
                    }
                }
                ReviewPhase::Approved => ReviewPhase::Approved,
            };
        }

        info!(rounds, approved = state.approved(), "review finished");
        Ok(state.into_outcome(rounds))
    }
}
