//! OpenAI-compatible chat completions summarizer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{SummaryError, SummaryResult};
use super::{Summarizer, render_entries, with_header};
use crate::cache::CommitEntries;
use crate::config::SummaryConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Sends the rendered diffs to a chat completions endpoint.
pub struct ChatSummarizer {
    config: SummaryConfig,
    api_key: String,
    http_client: Client,
}

impl ChatSummarizer {
    pub fn new(config: SummaryConfig, api_key: impl Into<String>) -> SummaryResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| SummaryError::Request {
                url: config.api_base.clone(),
                source,
            })?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            http_client,
        })
    }

    /// Build from settings, reading the key from `config.api_key_env`.
    pub fn from_config(config: &SummaryConfig) -> SummaryResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SummaryError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::new(config.clone(), api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, user_content: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        }
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    fn name(&self) -> &str {
        "chat"
    }

    async fn summarize(&self, entries: &CommitEntries) -> SummaryResult<String> {
        if entries.is_empty() {
            return Err(SummaryError::NothingToSummarize);
        }

        let url = self.endpoint();
        let user_content = render_entries(entries);
        crate::debug_event!("summary", "request", "{} paths to {url}", entries.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&user_content))
            .send()
            .await
            .map_err(|source| SummaryError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;

        let message = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SummaryError::InvalidResponse("no message in reply".to_string()))?;

        Ok(with_header(&message))
    }
}
