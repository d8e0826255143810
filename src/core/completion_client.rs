// src/core/completion_client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use super::config_manager::LlmSettings;
use super::ServiceClient;

/// Text completion capability used by the model-assisted extractor
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client
pub struct ChatCompletionClient {
    service: ServiceClient,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(settings: &LlmSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            service: ServiceClient::new(&settings.base_url, &settings.api_key, timeout)?,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.2,
        };

        info!("Sending completion request to {} ({})", self.service.base_url(), self.model);

        let response: ChatResponse = self
            .service
            .post_json("/chat/completions", &request)
            .await
            .context("Completion request failed")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Completion response had no content")
    }
}
