//! Prompt templates.
//!
//! Defaults are compiled in. A prompts directory may override any of them by
//! providing a file with the same name (`drafter.md`, `critic.md`, ...);
//! files that are absent fall back to the default.

use std::path::Path;

use tracing::debug;

use lunathink_shared::{LunathinkError, Result};

const RELEVANCE_CHECK: &str = include_str!("../prompts/relevance_check.md");
const SUMMARISE_PAGE: &str = include_str!("../prompts/summarise_page.md");
const DRAFTER: &str = include_str!("../prompts/drafter.md");
const CRITIC: &str = include_str!("../prompts/critic.md");
const DIGEST_TEMPLATE: &str = include_str!("../prompts/digest_template.md");

/// The full set of templates used by the model-backed roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Placeholder: `{topic}`.
    pub relevance_check: String,
    pub summarise_page: String,
    /// Placeholders: `{page_summaries}`, `{digest_template}`.
    pub drafter: String,
    pub critic: String,
    pub digest_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            relevance_check: RELEVANCE_CHECK.to_string(),
            summarise_page: SUMMARISE_PAGE.to_string(),
            drafter: DRAFTER.to_string(),
            critic: CRITIC.to_string(),
            digest_template: DIGEST_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// Load templates from `dir`, falling back to the defaults per file.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(LunathinkError::config(format!(
                "prompts directory {} does not exist",
                dir.display()
            )));
        }

        let defaults = Self::default();
        Ok(Self {
            relevance_check: read_or(dir, "relevance_check.md", defaults.relevance_check)?,
            summarise_page: read_or(dir, "summarise_page.md", defaults.summarise_page)?,
            drafter: read_or(dir, "drafter.md", defaults.drafter)?,
            critic: read_or(dir, "critic.md", defaults.critic)?,
            digest_template: read_or(dir, "digest_template.md", defaults.digest_template)?,
        })
    }
}

fn read_or(dir: &Path, file: &str, default: String) -> Result<String> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(default);
    }

    let text = std::fs::read_to_string(&path).map_err(|e| LunathinkError::io(&path, e))?;
    debug!(path = %path.display(), "prompt override loaded");
    Ok(text)
}

/// Substitute `{key}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_their_placeholders() {
        let prompts = PromptSet::default();
        assert!(prompts.relevance_check.contains("{topic}"));
        assert!(prompts.drafter.contains("{page_summaries}"));
        assert!(prompts.drafter.contains("{digest_template}"));
        assert!(!prompts.critic.is_empty());
        assert!(!prompts.digest_template.is_empty());
    }

    #[test]
    fn render_replaces_known_keys_only() {
        let out = render("About {topic} for {reader}.", &[("topic", "rust")]);
        assert_eq!(out, "About rust for {reader}.");
    }

    #[test]
    fn render_replaces_every_occurrence() {
        assert_eq!(render("{x} and {x}", &[("x", "y")]), "y and y");
    }

    #[test]
    fn load_overrides_present_files() {
        let dir = std::env::temp_dir().join(format!("lunathink-prompts-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("critic.md"), "Be harsh.").unwrap();

        let prompts = PromptSet::load(&dir).unwrap();
        assert_eq!(prompts.critic, "Be harsh.");
        assert_eq!(prompts.drafter, PromptSet::default().drafter);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_dir_is_config_error() {
        let dir = std::env::temp_dir().join(format!("lunathink-missing-{}", uuid::Uuid::now_v7()));
        assert!(matches!(
            PromptSet::load(&dir),
            Err(LunathinkError::Config { .. })
        ));
    }
}
