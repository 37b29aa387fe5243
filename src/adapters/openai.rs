//! OpenAI chat-completions adapter for post generation.
//!
//! Sends the transcript with a fixed prompt, strips markdown artifacts from
//! the reply and enforces the post length ceiling.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::{http_client, Summarizer};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest post the social network accepts
pub const MAX_POST_CHARS: usize = 280;

/// Characters kept before the ellipsis when a post is truncated
const TRUNCATED_CHARS: usize = 275;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const POST_PROMPT_TEMPLATE: &str = "You are a social media expert. Given the following YouTube \
video transcript, write a concise, engaging tweet (max 270 characters) summarizing the main idea. \
Use clear language and make it suitable for X (Twitter). Strictly forbidden to use emoji and \
hashtag.\n\nTranscript:\n{transcript}\n\nTweet:";

/// Model settings for post generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    280
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Why a completion failed
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Remove fenced code blocks, inline backticks and surrounding whitespace
pub fn clean_response(text: &str) -> String {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    static INLINE: OnceLock<Regex> = OnceLock::new();

    let fenced = FENCED.get_or_init(|| Regex::new(r"(?s)```(?:\w+)?\n(.*?)```").expect("valid regex"));
    let inline = INLINE.get_or_init(|| Regex::new(r"`([^`]*)`").expect("valid regex"));

    let text = fenced.replace_all(text, "$1");
    let text = inline.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Enforce the post length ceiling, cutting on character boundaries
pub fn truncate_post(text: &str) -> String {
    if text.chars().count() <= MAX_POST_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(TRUNCATED_CHARS).collect();
    format!("{}...", head)
}

/// OpenAI-backed summarizer
pub struct OpenAiSummarizer {
    api_key: Option<String>,
    base_url: String,
    settings: SummarizerSettings,
    client: reqwest::Client,
}

impl OpenAiSummarizer {
    /// Create a new summarizer
    pub fn new(
        api_key: Option<String>,
        settings: SummarizerSettings,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            settings,
            client: http_client(timeout)?,
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run one chat completion and return the raw reply
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            401 => return Err(CompletionError::Unauthorized),
            429 => return Err(CompletionError::RateLimited),
            _ if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(CompletionError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| CompletionError::Unexpected("response has no choices".to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str) -> Option<String> {
        info!(transcript_len = transcript.len(), "Generating post from transcript");

        let Some(api_key) = self.api_key.as_deref() else {
            error!("OPENAI_API_KEY is not configured");
            return None;
        };

        let prompt = POST_PROMPT_TEMPLATE.replace("{transcript}", transcript);
        match self.complete(api_key, &prompt).await {
            Ok(raw) => {
                let post = truncate_post(&clean_response(&raw));
                if post.is_empty() {
                    error!("Model returned an empty post");
                    None
                } else {
                    Some(post)
                }
            }
            Err(e) => {
                error!(model = %self.settings.model, "Error generating post: {}", e);
                None
            }
        }
    }
}
