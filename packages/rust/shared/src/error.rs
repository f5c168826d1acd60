//! Error types for Lunathink.
//!
//! Library crates use [`LunathinkError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// Pipeline stage whose failure aborts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Search,
    Relevance,
    Drafting,
    Critique,
    Delivery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Relevance => "relevance",
            Self::Drafting => "drafting",
            Self::Critique => "critique",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all Lunathink operations.
#[derive(Debug, thiserror::Error)]
pub enum LunathinkError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// Response parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Language-model call error (API, empty reply, schema mismatch).
    #[error("llm error: {0}")]
    Llm(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A load-bearing stage failed and the run was aborted.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<LunathinkError>,
    },

    /// The review loop hit its round cap without the critic approving.
    #[error("review did not converge after {rounds} rounds")]
    NotConverged { rounds: u32 },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LunathinkError>;

impl LunathinkError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Tag this error with the stage it aborted. Already-tagged errors keep
    /// their original stage.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            err @ Self::Stage { .. } => err,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error aborted, if it was tagged with one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LunathinkError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = LunathinkError::validation("no topics given");
        assert!(err.to_string().contains("no topics"));

        let err = LunathinkError::NotConverged { rounds: 5 };
        assert_eq!(err.to_string(), "review did not converge after 5 rounds");
    }

    #[test]
    fn at_stage_tags_and_displays() {
        let err = LunathinkError::Llm("rate limited".into()).at_stage(Stage::Critique);
        assert_eq!(err.stage(), Some(Stage::Critique));
        assert_eq!(err.to_string(), "critique failed: llm error: rate limited");
    }

    #[test]
    fn at_stage_keeps_first_tag() {
        let err = LunathinkError::Network("timeout".into())
            .at_stage(Stage::Delivery)
            .at_stage(Stage::Search);
        assert_eq!(err.stage(), Some(Stage::Delivery));
    }

    #[test]
    fn untagged_errors_have_no_stage() {
        assert_eq!(LunathinkError::NotConverged { rounds: 1 }.stage(), None);
    }
}
