//! Client for the conversational completion service.
//!
//! Stateless: every call carries the fixed system preamble followed by the
//! full ordered context the caller hands in.

use crate::config::{AssistantConfig, LogVerbosity, DEFAULT_ASSISTANT_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::error::EatMateError;
use crate::http::create_client;
use crate::logger::{log_call, CallRecord};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const SERVICE: &str = "assistant";

/// Guidance sent ahead of every conversation.
pub const SYSTEM_PREAMBLE: &str = "You are EatMate, a helpful cooking and nutrition assistant. \
Provide concise, practical advice about cooking, recipes, nutrition, and food preparation. \
Keep responses under 150 words unless more detail is specifically requested.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion API client.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    verbosity: LogVerbosity,
}

impl CompletionClient {
    pub fn new() -> Self {
        Self {
            client: create_client(),
            base_url: DEFAULT_ASSISTANT_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            verbosity: LogVerbosity::default(),
        }
    }

    pub fn from_config(config: &AssistantConfig, verbosity: LogVerbosity) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            verbosity,
            ..Self::new()
        }
        .with_base_url(&config.base_url)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Request body: preamble first, then `context` in order, unmodified.
    fn request_body<'a>(&'a self, context: &[ChatMessage]) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(context.len() + 1);
        messages.push(ChatMessage::new(Role::System, SYSTEM_PREAMBLE));
        messages.extend_from_slice(context);

        CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate the next assistant turn for `context`.
    pub async fn complete(&self, context: &[ChatMessage]) -> Result<String, EatMateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EatMateError::ApiKeyMissing("completion API".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let start = Instant::now();
        let result = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(context))
            .send()
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.log(&url, None, elapsed_ms);
                return Err(e.into());
            }
        };

        let status = response.status();
        self.log(&url, Some(status.as_u16()), elapsed_ms);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(EatMateError::from_response_body(status.as_u16(), &body));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EatMateError::ParseError("completion response had no content".to_string()))
    }

    fn log(&self, url: &str, status: Option<u16>, elapsed_ms: u64) {
        log_call(
            &CallRecord {
                service: SERVICE,
                method: "POST",
                url,
                status,
                elapsed_ms,
            },
            self.verbosity,
        );
    }
}

impl Default for CompletionClient {
    fn default() -> Self {
        Self::new()
    }
}
