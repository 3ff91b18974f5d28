use std::sync::Arc;

use crate::config::Config;
use crate::models::{Criterion, MovieRecord, Recommendation};

pub mod fallback;
pub mod llm;
pub mod sampling;

pub use fallback::FallbackRecommender;
pub use llm::{CompletionClient, LlmRecommender, OpenAiClient};

/// Recommendation provider capability.
///
/// Two implementations exist: the LLM-backed selector and the rule-based
/// fallback. Which one serves a process is decided once at construction
/// (`build_recommender`), so call sites never branch on backend presence.
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    /// Selects an ordered, size-bounded subsequence of `pool` matching the
    /// criterion, each entry optionally annotated with a reason. Never
    /// fails: the worst outcome is an empty list.
    async fn propose(
        &self,
        criterion: &Criterion,
        pool: &[MovieRecord],
        limit: usize,
    ) -> Vec<Recommendation>;
}

/// Builds the recommendation provider for the configured environment. An
/// unset credential permanently routes every request to the fallback.
pub fn build_recommender(config: &Config) -> Arc<dyn Recommender> {
    match &config.openai_api_key {
        Some(api_key) => {
            tracing::info!(model = %config.openai_model, "LLM recommendation backend configured");
            let client = OpenAiClient::new(
                api_key.clone(),
                config.openai_api_url.clone(),
                config.openai_model.clone(),
            );
            Arc::new(LlmRecommender::new(client))
        }
        None => {
            tracing::info!("No recommendation backend credential, using rule-based fallback");
            Arc::new(FallbackRecommender::new())
        }
    }
}
