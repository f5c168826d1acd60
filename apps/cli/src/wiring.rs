//! Builds the concrete collaborators from configuration.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use lunathink_core::Collaborators;
use lunathink_crawler::{ScrapingFetcher, ScrapingOptions};
use lunathink_llm::{LlmRoles, OpenAiClient, PromptSet};
use lunathink_mailer::{BrevoMailer, BrevoOptions};
use lunathink_search::{SerperOptions, SerperSearch};
use lunathink_shared::{AppConfig, Result};

/// Resolve the prompt set: the configured directory if any, else defaults.
pub(crate) fn load_prompts(config: &AppConfig) -> Result<PromptSet> {
    match &config.prompts_dir {
        Some(dir) => {
            debug!(dir = %dir, "loading prompt overrides");
            PromptSet::load(Path::new(dir))
        }
        None => Ok(PromptSet::default()),
    }
}

/// Wire the production collaborators. API keys are read here, once.
pub(crate) fn build_collaborators(config: &AppConfig) -> Result<Collaborators> {
    let prompts = load_prompts(config)?;
    let client = OpenAiClient::from_config(&config.openai)?;
    let roles = LlmRoles::new(client, &config.openai.model, &prompts);

    Ok(Collaborators {
        search: Arc::new(SerperSearch::new(SerperOptions::from_config(&config.search)?)?),
        content: Arc::new(ScrapingFetcher::new(ScrapingOptions::from_config(
            &config.scraping,
        )?)?),
        judge: Arc::new(roles.judge),
        condenser: Arc::new(roles.condenser),
        drafter: Arc::new(roles.drafter),
        critic: Arc::new(roles.critic),
        dispatcher: Arc::new(BrevoMailer::new(BrevoOptions::from_config(&config.email)?)?),
    })
}
