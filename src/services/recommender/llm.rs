use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{Criterion, MovieRecord, Recommendation};
use crate::services::recommender::fallback::FallbackRecommender;
use crate::services::recommender::sampling::{diverse_sample, PROMPT_SAMPLE_SIZE};
use crate::services::recommender::Recommender;

/// At most this many sampled movies are considered for the prompt
const PROMPT_POOL: usize = 100;

/// At most this many candidates are serialized into the prompt itself
const PROMPT_MOVIES: usize = 50;

const MAX_TOKENS: u32 = 1024;

const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat completion backend abstraction. One call per request, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends a single chat completion request and returns the raw reply
    /// content, which is expected to be a JSON object
    async fn complete(&self, system: &str, user: &str) -> AppResult<String>;
}

/// OpenAI-compatible chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(BACKEND_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "response_format": {"type": "json_object"},
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalApi("Empty completion response".to_string()))
    }
}

/// Candidate shape serialized into the prompt
#[derive(Serialize)]
struct CandidateMovie<'a> {
    title: &'a str,
    genres: &'a [String],
    rating: f64,
}

/// Expected reply shape; the backend is instructed to return exactly this
#[derive(Debug, Deserialize)]
struct BackendReply {
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    reason: String,
}

/// LLM-backed recommendation provider.
///
/// Builds a diverse sample of the pool, asks the backend to pick titles
/// from a bounded candidate list under a fixed JSON contract, and maps the
/// reply back onto the sample. Any failure on the way falls through to the
/// rule-based fallback.
pub struct LlmRecommender<C: CompletionClient> {
    backend: C,
    fallback: FallbackRecommender,
}

impl<C: CompletionClient> LlmRecommender<C> {
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            fallback: FallbackRecommender::new(),
        }
    }

    fn build_prompt(criterion: &Criterion, candidates_json: &str, limit: usize) -> (String, String) {
        match criterion {
            Criterion::Mood(mood) => {
                let system = "You are a movie recommendation expert. You understand human \
                              emotions and can suggest movies that match different moods. \
                              Always respond with valid JSON."
                    .to_string();
                let user = format!(
                    "Based on the user's mood: \"{mood}\", recommend the best movies from this list.\n\n\
                     Available movies: {candidates_json}\n\n\
                     Return a JSON object with this exact format:\n\
                     {{\"recommendations\": [\"Movie Title 1\", \"Movie Title 2\", ...], \"reason\": \"Brief explanation of why these movies match the mood\"}}\n\n\
                     Select up to {limit} movies that best match the mood. Only include movies from the provided list."
                );
                (system, user)
            }
            Criterion::Genre(genre) => {
                let system = "You are a movie recommendation expert. Help users find the \
                              best movies in their preferred genres. Always respond with \
                              valid JSON."
                    .to_string();
                let user = format!(
                    "The user wants to watch movies in the \"{genre}\" genre.\n\n\
                     Available movies with their genres: {candidates_json}\n\n\
                     Return a JSON object with this exact format:\n\
                     {{\"recommendations\": [\"Movie Title 1\", \"Movie Title 2\", ...], \"reason\": \"Brief explanation of the selection\"}}\n\n\
                     Select up to {limit} movies that best match the requested genre. Prioritize higher-rated movies. Only include movies from the provided list."
                );
                (system, user)
            }
        }
    }

    async fn backend_picks(
        &self,
        criterion: &Criterion,
        pool: &[MovieRecord],
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let sample = diverse_sample(pool, PROMPT_SAMPLE_SIZE);

        let candidates: Vec<CandidateMovie> = sample
            .iter()
            .take(PROMPT_POOL)
            .map(|m| CandidateMovie {
                title: &m.title,
                genres: &m.genres,
                rating: m.vote_average,
            })
            .collect();
        let prompt_slice = &candidates[..candidates.len().min(PROMPT_MOVIES)];
        let candidates_json = serde_json::to_string(prompt_slice)
            .map_err(|e| AppError::Internal(format!("Prompt serialization error: {}", e)))?;

        let (system, user) = Self::build_prompt(criterion, &candidates_json, limit);
        let content = self.backend.complete(&system, &user).await?;

        let reply: BackendReply = serde_json::from_str(&content)
            .map_err(|e| AppError::ExternalApi(format!("Malformed backend reply: {}", e)))?;

        let chosen: HashSet<&str> = reply.recommendations.iter().map(String::as_str).collect();
        // Only mood selections carry the justification through to clients
        let reason = match criterion {
            Criterion::Mood(_) => Some(reply.reason.clone()),
            Criterion::Genre(_) => None,
        };

        // Titles the backend invented (not in the sample) are silently
        // dropped; sample order is preserved.
        let mut picks = Vec::new();
        for movie in &sample {
            if picks.len() >= limit {
                break;
            }
            if chosen.contains(movie.title.as_str()) {
                picks.push(Recommendation::with_reason((*movie).clone(), reason.clone()));
            }
        }

        tracing::info!(
            criterion = %criterion.text(),
            requested = reply.recommendations.len(),
            matched = picks.len(),
            "Backend recommendations mapped onto sample"
        );

        Ok(picks)
    }
}

#[async_trait::async_trait]
impl<C: CompletionClient> Recommender for LlmRecommender<C> {
    async fn propose(
        &self,
        criterion: &Criterion,
        pool: &[MovieRecord],
        limit: usize,
    ) -> Vec<Recommendation> {
        match self.backend_picks(criterion, pool, limit).await {
            Ok(picks) => picks,
            Err(e) => {
                tracing::error!(error = %e, "Recommendation backend failed, using fallback");
                self.fallback.propose(criterion, pool, limit).await
            }
        }
    }
}
