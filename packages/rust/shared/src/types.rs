//! Core domain types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Search & relevance
// ---------------------------------------------------------------------------

/// One raw search result for a topic.
///
/// `id` is the 1-based position inside this topic's result set. It is only
/// unique within one topic round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub topic: String,
}

/// The judge's verdict that a hit is relevant to its topic.
///
/// `hit_id` is whatever the judge wrote; it is matched against the ids of
/// the same topic round and ignored when it matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    pub hit_id: String,
    pub justification: String,
}

// ---------------------------------------------------------------------------
// Acquisition & summarization
// ---------------------------------------------------------------------------

/// Output of the acquisition collaborator for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPage {
    /// Normalized Markdown text.
    pub text: String,
    /// Title extracted during normalization, if any.
    pub title: Option<String>,
}

/// A relevant page whose content was fetched and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquiredPage {
    pub url: String,
    pub title: String,
    pub normalized_text: String,
}

/// A bounded summary of one acquired page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub summary_text: String,
}

// ---------------------------------------------------------------------------
// Review conversation
// ---------------------------------------------------------------------------

/// One entry in the append-only drafter/critic conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewMessage {
    /// A consolidated digest produced by the drafter, with an optional
    /// remark addressed to the critic.
    Draft {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// The critic's reply to the preceding draft.
    Feedback { text: String },
}

impl ReviewMessage {
    pub fn text(&self) -> &str {
        match self {
            Self::Draft { text, .. } | Self::Feedback { text } => text,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft { .. })
    }
}

/// What the drafter returns for one drafting step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReply {
    pub text: String,
    pub note: Option<String>,
}

/// What the critic returns for one critique step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueReply {
    pub approved: bool,
    pub feedback: String,
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who receives the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}
