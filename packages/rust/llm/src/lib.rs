//! Language-model collaborators for Lunathink.
//!
//! - [`OpenAiClient`] — minimal chat-completions client with structured output
//! - [`PromptSet`] — the prompt templates, compiled-in or loaded from a directory
//! - [`LlmRelevanceJudge`], [`LlmCondenser`], [`LlmDrafter`], [`LlmCritic`] —
//!   the model-backed implementations of the pipeline roles

pub mod client;
pub mod prompts;
pub mod roles;
pub mod schema;
pub mod types;

pub use client::OpenAiClient;
pub use prompts::{PromptSet, render};
pub use roles::{LlmCondenser, LlmCritic, LlmDrafter, LlmRelevanceJudge, LlmRoles};
pub use schema::StructuredOutput;
pub use types::{ChatMessage, ChatRequest, ChatRole};
