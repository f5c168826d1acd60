//! In-memory collaborators for exercising the pipeline without the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lunathink_shared::{
    Condenser, ContentSource, Critic, CritiqueReply, DraftReply, Drafter, Dispatcher,
    LunathinkError, NormalizedPage, PageSummary, Recipient, RelevanceJudge, RelevanceVerdict,
    Result, ReviewMessage, SearchHit, SearchProvider,
};

use crate::pipeline::Collaborators;

pub fn hit(id: u32, topic: &str) -> SearchHit {
    SearchHit {
        id,
        title: format!("Hit {id}"),
        url: format!("https://{topic}.example/{id}"),
        snippet: format!("snippet {id}"),
        topic: topic.to_string(),
    }
}

pub fn summary(url: &str, text: &str) -> PageSummary {
    PageSummary {
        url: url.to_string(),
        summary_text: text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Returns `n` hits per topic, or fails for topics listed in `failing`.
#[derive(Default)]
pub struct FakeSearch {
    pub hits_per_topic: HashMap<String, u32>,
    pub failing: Vec<String>,
}

impl FakeSearch {
    pub fn with(topic: &str, n: u32) -> Self {
        let mut search = Self::default();
        search.hits_per_topic.insert(topic.to_string(), n);
        search
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if self.failing.iter().any(|t| t == query) {
            return Err(LunathinkError::Network(format!("search down for {query}")));
        }
        let n = self.hits_per_topic.get(query).copied().unwrap_or(0);
        Ok((1..=n).map(|id| hit(id, query)).collect())
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Serves `page text for <url>` unless the URL is in `failing` (or all fail).
#[derive(Default)]
pub struct FakeContent {
    pub failing: Vec<String>,
    pub fail_all: bool,
    pub title: Option<String>,
}

#[async_trait]
impl ContentSource for FakeContent {
    async fn fetch_and_normalize(&self, url: &str) -> Result<NormalizedPage> {
        if self.fail_all || self.failing.iter().any(|u| u == url) {
            return Err(LunathinkError::Network(format!("{url}: HTTP 500")));
        }
        Ok(NormalizedPage {
            text: format!("page text for {url}"),
            title: self.title.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Judge
// ---------------------------------------------------------------------------

/// Returns the configured raw ids as verdicts and counts its calls.
#[derive(Default)]
pub struct FakeJudge {
    pub ids: Vec<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl FakeJudge {
    pub fn relevant(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelevanceJudge for FakeJudge {
    async fn judge(&self, topic: &str, hits: &[SearchHit]) -> Result<Vec<RelevanceVerdict>> {
        self.calls.lock().unwrap().push((topic.to_string(), hits.len()));
        if self.fail {
            return Err(LunathinkError::Llm("judge unavailable".into()));
        }
        Ok(self
            .ids
            .iter()
            .map(|id| RelevanceVerdict {
                hit_id: id.clone(),
                justification: "on topic".into(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Condenser
// ---------------------------------------------------------------------------

/// Summaries are `summary of <text>`; texts containing a marker in `failing`
/// fail, and `blank` ones come back empty.
#[derive(Default)]
pub struct FakeCondenser {
    pub failing: Vec<String>,
    pub blank: Vec<String>,
    pub inputs: Mutex<Vec<String>>,
}

impl FakeCondenser {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Condenser for FakeCondenser {
    async fn condense(&self, text: &str) -> Result<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        if self.failing.iter().any(|m| text.contains(m.as_str())) {
            return Err(LunathinkError::Llm("condense failed".into()));
        }
        if self.blank.iter().any(|m| text.contains(m.as_str())) {
            return Ok("  ".into());
        }
        Ok(format!("summary of {text}"))
    }
}

// ---------------------------------------------------------------------------
// Review roles
// ---------------------------------------------------------------------------

/// What the drafter saw on one call.
#[derive(Debug, Clone)]
pub struct DraftCall {
    pub history: Vec<ReviewMessage>,
    pub summaries: Vec<PageSummary>,
}

/// Produces `D1`, `D2`, ... and records every call.
#[derive(Default)]
pub struct ScriptedDrafter {
    pub fail_on: Option<usize>,
    pub calls: Mutex<Vec<DraftCall>>,
}

impl ScriptedDrafter {
    pub fn calls(&self) -> Vec<DraftCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Drafter for ScriptedDrafter {
    async fn draft(
        &self,
        history: &[ReviewMessage],
        summaries: &[PageSummary],
    ) -> Result<DraftReply> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(DraftCall {
            history: history.to_vec(),
            summaries: summaries.to_vec(),
        });
        let n = calls.len();
        if self.fail_on == Some(n) {
            return Err(LunathinkError::Llm("drafter timed out".into()));
        }
        Ok(DraftReply {
            text: format!("D{n}"),
            note: Some(format!("note {n}")),
        })
    }
}

/// Approves on round `approve_on` (never when `None`) and records the
/// history length it saw.
#[derive(Default)]
pub struct ScriptedCritic {
    pub approve_on: Option<usize>,
    pub fail: bool,
    pub seen: Mutex<Vec<usize>>,
}

impl ScriptedCritic {
    pub fn approving_on(round: usize) -> Self {
        Self {
            approve_on: Some(round),
            ..Self::default()
        }
    }

    pub fn rounds(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Critic for ScriptedCritic {
    async fn critique(&self, history: &[ReviewMessage]) -> Result<CritiqueReply> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(history.len());
        if self.fail {
            return Err(LunathinkError::Llm("critic unavailable".into()));
        }
        let round = seen.len();
        let approved = self.approve_on == Some(round);
        Ok(CritiqueReply {
            approved,
            feedback: if approved {
                "looks good".into()
            } else {
                format!("revise {round}")
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingDispatcher {
    pub fail: bool,
    pub sent: Mutex<Vec<(Recipient, String)>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<()> {
        if self.fail {
            return Err(LunathinkError::Network("mail rejected".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), body.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Typed handles to every fake, plus the erased [`Collaborators`] view.
pub struct Fakes {
    pub search: Arc<FakeSearch>,
    pub content: Arc<FakeContent>,
    pub judge: Arc<FakeJudge>,
    pub condenser: Arc<FakeCondenser>,
    pub drafter: Arc<ScriptedDrafter>,
    pub critic: Arc<ScriptedCritic>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl Fakes {
    pub fn new(search: FakeSearch, judge: FakeJudge, critic: ScriptedCritic) -> Self {
        Self {
            search: Arc::new(search),
            content: Arc::new(FakeContent::default()),
            judge: Arc::new(judge),
            condenser: Arc::new(FakeCondenser::default()),
            drafter: Arc::new(ScriptedDrafter::default()),
            critic: Arc::new(critic),
            dispatcher: Arc::new(RecordingDispatcher::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            search: self.search.clone(),
            content: self.content.clone(),
            judge: self.judge.clone(),
            condenser: self.condenser.clone(),
            drafter: self.drafter.clone(),
            critic: self.critic.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}
