//! Travel assistant chat
//!
//! Single-turn prompts sent to a hosted language model. Failures never
//! surface as errors: the transcript receives a fixed assistant reply
//! instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::config::LlmConfig;
use crate::session::Session;
use crate::{GuideError, Result};

pub const API_KEY_REQUIRED: &str = "An API key is required to use the assistant.";
pub const ASSISTANT_UNAVAILABLE: &str = "The assistant could not answer right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    fn now(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// A hosted text-completion model
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    /// Per-request limit; `None` leaves the client default in place
    timeout: Option<Duration>,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cityguide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GuideError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            timeout: config
                .timeout_seconds
                .map(|seconds| Duration::from_secs(seconds.into())),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let start_time = Instant::now();
        let mut request = self
            .client
            .post(self.endpoint())
            .json(&gemini::GenerateRequest::from_prompt(prompt));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GuideError::network(format!("Assistant request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GuideError::api(format!("Assistant answered {status}")));
        }

        let body: gemini::GenerateResponse = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("Failed to parse assistant response: {e}")))?;

        let text = body
            .first_text()
            .ok_or_else(|| GuideError::api("Assistant returned no candidates"))?;
        info!(
            "Assistant replied with {} chars in {:.3}s",
            text.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}

/// Gemini wire types
pub mod gemini {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct GenerateRequest {
        pub contents: Vec<Content>,
    }

    impl GenerateRequest {
        #[must_use]
        pub fn from_prompt(prompt: &str) -> Self {
            Self {
                contents: vec![Content {
                    parts: vec![Part {
                        text: Some(prompt.to_string()),
                    }],
                }],
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Content {
        #[serde(default)]
        pub parts: Vec<Part>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Part {
        pub text: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GenerateResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Candidate {
        pub content: Option<Content>,
    }

    impl GenerateResponse {
        /// Concatenated text parts of the first candidate
        #[must_use]
        pub fn first_text(&self) -> Option<String> {
            let content = self.candidates.first()?.content.as_ref()?;
            let text: String = content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect();
            (!text.is_empty()).then_some(text)
        }
    }
}

/// Chat front end over an optional provider
pub struct ChatPanel {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl ChatPanel {
    /// `None` means no API key is configured
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    /// Build from configuration; a missing key leaves the panel keyless
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = match &config.api_key {
            Some(key) => {
                Some(Arc::new(GeminiClient::new(config, key.clone())?) as Arc<dyn CompletionProvider>)
            }
            None => None,
        };
        Ok(Self::new(provider))
    }

    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Ask the assistant; the user turn and the reply are appended to the
    /// session transcript in that order.
    pub async fn ask(&self, session: &mut Session, prompt: &str) -> String {
        session.transcript.push(ChatTurn::now(ChatRole::User, prompt));

        let reply = match &self.provider {
            None => API_KEY_REQUIRED.to_string(),
            Some(provider) => match provider.complete(prompt).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Assistant unavailable: {}", e);
                    ASSISTANT_UNAVAILABLE.to_string()
                }
            },
        };

        session
            .transcript
            .push(ChatTurn::now(ChatRole::Assistant, reply.clone()));
        reply
    }
}
