//! Shared types, error model, configuration and collaborator contracts for Lunathink.
//!
//! This crate is the foundation depended on by all other Lunathink crates.
//! It provides:
//! - [`LunathinkError`] — the unified error type
//! - Domain types ([`SearchHit`], [`AcquiredPage`], [`PageSummary`], [`ReviewMessage`])
//! - Configuration ([`AppConfig`], [`RunSettings`], config loading)
//! - Collaborator traits ([`SearchProvider`], [`ContentSource`], [`Drafter`], ...)

pub mod config;
pub mod error;
pub mod providers;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EmailConfig, ExhaustionPolicy, OpenAiConfig, PipelineConfig, ReviewConfig,
    RunSettings, ScrapingConfig, SearchConfig, SummarizeConfig, api_key, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from, validate_api_keys,
};
pub use error::{LunathinkError, Result, Stage};
pub use providers::{
    Condenser, ContentSource, Critic, Dispatcher, Drafter, RelevanceJudge, SearchProvider,
};
pub use types::{
    AcquiredPage, CritiqueReply, DraftReply, NormalizedPage, PageSummary, Recipient,
    RelevanceVerdict, ReviewMessage, RunId, SearchHit,
};
