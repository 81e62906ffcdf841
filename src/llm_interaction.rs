use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::constants; // For OPENAI_BASE_URL, OPENAI_API_KEY and ESTIMATOR_MODEL

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to send request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chat completion request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to parse chat completion response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("chat completion response contained no choices")]
    NoChoices,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: constants::OPENAI_BASE_URL.clone(),
            api_key: constants::OPENAI_API_KEY.clone(),
            model: constants::ESTIMATOR_MODEL.clone(),
            timeout: Duration::from_secs(*constants::REQUEST_TIMEOUT_SECS),
        }
    }
}

// Structures matching the /chat/completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    // usage, id, etc. are ignored
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// Sends single-message conversations to an OpenAI-compatible
/// chat-completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ChatError::Client)?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends `prompt` as the only user message and returns the text of the
    /// first choice. A null content comes back as an empty string.
    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    pub async fn ask(&self, prompt: &str) -> Result<String, ChatError> {
        if self.config.api_key.is_empty() {
            return Err(ChatError::MissingApiKey);
        }

        let url = self.completions_url();
        let request_payload = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(%url, prompt_len = prompt.len(), "Sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request_payload)
            .send()
            .await
            .map_err(|source| ChatError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Chat completion request failed");
            return Err(ChatError::Status { status, body });
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(ChatError::Decode)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::NoChoices)?
            .message
            .content
            .unwrap_or_default();

        debug!(response_len = content.len(), "Received chat completion");
        Ok(content)
    }
}
