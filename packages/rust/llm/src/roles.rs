//! Model-backed implementations of the pipeline roles.
//!
//! Each role owns its prompt template and shares one [`OpenAiClient`]. The
//! drafter and critic replay the review history from their own side of the
//! conversation: the drafter's drafts are its assistant turns, and for the
//! critic the roles are flipped.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use lunathink_shared::{
    Condenser, Critic, CritiqueReply, DraftReply, Drafter, LunathinkError, PageSummary,
    RelevanceJudge, RelevanceVerdict, Result, ReviewMessage, SearchHit,
};

use crate::client::OpenAiClient;
use crate::prompts::{PromptSet, render};
use crate::types::ChatMessage;

/// Opening user turn of the drafter conversation.
const DRAFT_KICKOFF: &str = "Write the digest from the page summaries.";

// ---------------------------------------------------------------------------
// Reply schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
struct RelevanceCheck {
    relevant_results: Vec<RelevantResult>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RelevantResult {
    /// Why this result matters for the topic.
    explanation: String,
    /// The `id` of the search result, exactly as given.
    id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DigestDraft {
    /// Complete HTML body of the digest.
    digest: String,
    /// Note to the reviewer about this version.
    message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DigestReview {
    approved: bool,
    message: String,
}

#[derive(Serialize)]
struct HitView<'a> {
    id: u32,
    title: &'a str,
    link: &'a str,
    snippet: &'a str,
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// All four roles built from one client, model and prompt set.
pub struct LlmRoles {
    pub judge: LlmRelevanceJudge,
    pub condenser: LlmCondenser,
    pub drafter: LlmDrafter,
    pub critic: LlmCritic,
}

impl LlmRoles {
    pub fn new(client: OpenAiClient, model: &str, prompts: &PromptSet) -> Self {
        Self {
            judge: LlmRelevanceJudge::new(client.clone(), model, &prompts.relevance_check),
            condenser: LlmCondenser::new(client.clone(), model, &prompts.summarise_page),
            drafter: LlmDrafter::new(
                client.clone(),
                model,
                &prompts.drafter,
                &prompts.digest_template,
            ),
            critic: LlmCritic::new(client, model, &prompts.critic),
        }
    }
}

pub struct LlmRelevanceJudge {
    client: OpenAiClient,
    model: String,
    prompt: String,
}

impl LlmRelevanceJudge {
    pub fn new(client: OpenAiClient, model: &str, prompt: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

#[async_trait]
impl RelevanceJudge for LlmRelevanceJudge {
    #[instrument(skip_all, fields(topic = %topic, hits = hits.len()))]
    async fn judge(&self, topic: &str, hits: &[SearchHit]) -> Result<Vec<RelevanceVerdict>> {
        let view: Vec<HitView<'_>> = hits
            .iter()
            .map(|h| HitView {
                id: h.id,
                title: &h.title,
                link: &h.url,
                snippet: &h.snippet,
            })
            .collect();
        let results = serde_json::to_string_pretty(&view)
            .map_err(|e| LunathinkError::Conversion(format!("search results: {e}")))?;

        let messages = vec![
            ChatMessage::system(render(&self.prompt, &[("topic", topic)])),
            ChatMessage::user(results),
        ];

        let reply: RelevanceCheck = self.client.extract(&self.model, messages).await?;
        debug!(relevant = reply.relevant_results.len(), "relevance verdicts");

        Ok(reply
            .relevant_results
            .into_iter()
            .map(|r| RelevanceVerdict {
                hit_id: r.id,
                justification: r.explanation,
            })
            .collect())
    }
}

pub struct LlmCondenser {
    client: OpenAiClient,
    model: String,
    prompt: String,
}

impl LlmCondenser {
    pub fn new(client: OpenAiClient, model: &str, prompt: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

#[async_trait]
impl Condenser for LlmCondenser {
    #[instrument(skip_all, fields(chars = text.len()))]
    async fn condense(&self, text: &str) -> Result<String> {
        let messages = vec![ChatMessage::system(&self.prompt), ChatMessage::user(text)];
        let summary = self.client.chat(&self.model, messages).await?;
        Ok(summary.trim().to_string())
    }
}

pub struct LlmDrafter {
    client: OpenAiClient,
    model: String,
    prompt: String,
    digest_template: String,
}

impl LlmDrafter {
    pub fn new(client: OpenAiClient, model: &str, prompt: &str, digest_template: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
            digest_template: digest_template.to_string(),
        }
    }
}

#[async_trait]
impl Drafter for LlmDrafter {
    #[instrument(skip_all, fields(history = history.len(), summaries = summaries.len()))]
    async fn draft(
        &self,
        history: &[ReviewMessage],
        summaries: &[PageSummary],
    ) -> Result<DraftReply> {
        let summaries_json = serde_json::to_string_pretty(summaries)
            .map_err(|e| LunathinkError::Conversion(format!("page summaries: {e}")))?;
        let system = render(
            &self.prompt,
            &[
                ("page_summaries", summaries_json.as_str()),
                ("digest_template", self.digest_template.as_str()),
            ],
        );

        let reply: DigestDraft = self
            .client
            .extract(&self.model, drafter_messages(system, history))
            .await?;

        if reply.digest.trim().is_empty() {
            return Err(LunathinkError::Llm("drafter returned an empty digest".into()));
        }

        let note = Some(reply.message.trim().to_string()).filter(|n| !n.is_empty());
        Ok(DraftReply {
            text: reply.digest,
            note,
        })
    }
}

pub struct LlmCritic {
    client: OpenAiClient,
    model: String,
    prompt: String,
}

impl LlmCritic {
    pub fn new(client: OpenAiClient, model: &str, prompt: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    #[instrument(skip_all, fields(history = history.len()))]
    async fn critique(&self, history: &[ReviewMessage]) -> Result<CritiqueReply> {
        let reply: DigestReview = self
            .client
            .extract(&self.model, critic_messages(&self.prompt, history))
            .await?;

        Ok(CritiqueReply {
            approved: reply.approved,
            feedback: reply.message,
        })
    }
}

// ---------------------------------------------------------------------------
// History replay
// ---------------------------------------------------------------------------

fn draft_turn(text: &str, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("{text}\n\nNote from the writer: {note}"),
        None => text.to_string(),
    }
}

fn drafter_messages(system: String, history: &[ReviewMessage]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system), ChatMessage::user(DRAFT_KICKOFF)];
    messages.extend(history.iter().map(|m| match m {
        ReviewMessage::Draft { text, note } => ChatMessage::assistant(draft_turn(text, note.as_deref())),
        ReviewMessage::Feedback { text } => ChatMessage::user(text),
    }));
    messages
}

fn critic_messages(prompt: &str, history: &[ReviewMessage]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(prompt)];
    messages.extend(history.iter().map(|m| match m {
        ReviewMessage::Draft { text, note } => ChatMessage::user(draft_turn(text, note.as_deref())),
        ReviewMessage::Feedback { text } => ChatMessage::assistant(text),
    }));
    messages
}
