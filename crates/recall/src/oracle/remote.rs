//! Remote oracle using OpenAI-compatible APIs
//!
//! Implements the [`Oracle`] trait over HTTP. Supports any OpenAI-compatible
//! endpoint with configurable URL, model, and API key via environment variable.
//! There is no retry here: a failed call fails the run, and callers may retry
//! the whole run.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::OracleConfig;
use crate::error::{RecallError, Result};
use crate::oracle::{Oracle, OracleError};

/// Oracle backed by an OpenAI-compatible chat completion endpoint
#[derive(Debug)]
pub struct RemoteOracle {
    client: Client,
    config: OracleConfig,
    api_key: String,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message in the chat completion request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

/// Choice in the chat completion response
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Message in the response choice
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl RemoteOracle {
    /// Create a new remote oracle with the given configuration
    ///
    /// Reads the API key from the environment variable named by `api_key_env`.
    /// Returns a configuration error if it is not set.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            RecallError::Config(format!("API key env var '{}' not set", config.api_key_env))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecallError::Config(format!("Failed to build HTTP client: {e}")))?;

        info!(
            "RemoteOracle initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.config.timeout())
        } else {
            OracleError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Oracle for RemoteOracle {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, OracleError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = self.endpoint();
        debug!("Calling remote oracle at: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Transport(format!(
                "API returned {status}: {error_text}"
            )));
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let completion: ChatCompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| OracleError::Protocol(format!("Undecodable completion: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Protocol("Completion has no content".to_string()))
    }

    fn name(&self) -> &str {
        "remote"
    }
}
