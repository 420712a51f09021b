// ABOUTME: Chat Completions client for hosted and local OpenAI-compatible endpoints
// ABOUTME: Presets for OpenAI, Hugging Face router, Ollama and LM Studio with bounded retries

use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER_LOG_TARGET: &str = "recipegraph::llm";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    /// Base URL including the version segment, e.g. "http://localhost:1234/v1"
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Extra attempts after the first one for transient failures
    pub max_retries: u32,
    /// First backoff delay; doubled on every further attempt
    pub retry_delay_ms: u64,
    /// Local servers run without one
    pub api_key: Option<String>,
    pub provider_name: String,
}

impl Default for OpenAICompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: LMSTUDIO_BASE_URL.to_string(),
            model: "local-model".to_string(),
            timeout_secs: 120,
            max_retries: 3,
            retry_delay_ms: 1000,
            api_key: None,
            provider_name: "openai-compatible".to_string(),
        }
    }
}

impl OpenAICompatibleConfig {
    fn preset(provider_name: &str, base_url: &str, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            model,
            api_key,
            provider_name: provider_name.to_string(),
            ..Default::default()
        }
    }

    pub fn openai(model: String, api_key: String) -> Self {
        Self::preset("openai", OPENAI_BASE_URL, model, Some(api_key))
    }

    /// Hugging Face inference router; `token` is an `hf_...` access token.
    pub fn huggingface(model: String, token: String) -> Self {
        Self::preset("huggingface", HUGGINGFACE_BASE_URL, model, Some(token))
    }

    pub fn lm_studio(model: String) -> Self {
        Self::preset("lmstudio", LMSTUDIO_BASE_URL, model, None)
    }

    pub fn ollama(model: String) -> Self {
        Self::preset("ollama", OLLAMA_BASE_URL, model, None)
    }

    pub fn custom(base_url: String, model: String, provider_name: String) -> Self {
        Self::preset(&provider_name, &base_url, model, None)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(1 << (attempt - 1).min(16)))
    }
}

/// Outcome of a single HTTP attempt.
enum AttemptError {
    /// Worth another try: transport errors, 429 and 5xx
    Transient(anyhow::Error),
    /// Bad key, unknown model, malformed request
    Fatal(anyhow::Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    client: Client,
}

impl OpenAICompatibleProvider {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAICompatibleConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_with_retry(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        let attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.backoff(attempt)).await;
            }

            match self.send_once(request).await {
                Ok(reply) => return Ok(reply),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(e)) => {
                    warn!(
                        target: PROVIDER_LOG_TARGET,
                        "{} request failed (attempt {}/{}): {:#}",
                        self.config.provider_name,
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no request attempts were made")))
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<ChatReply, AttemptError> {
        let response = self
            .authorized(self.client.post(self.config.endpoint("chat/completions")))
            .json(request)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to reach {} at {}",
                    self.config.provider_name, self.config.base_url
                )
            })
            .map_err(AttemptError::Transient)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = anyhow!("{} API error ({}): {}", self.config.provider_name, status, body);
            return Err(if is_retryable(status) {
                AttemptError::Transient(error)
            } else {
                AttemptError::Fatal(error)
            });
        }

        response
            .json::<ChatReply>()
            .await
            .with_context(|| format!("Malformed {} chat response", self.config.provider_name))
            .map_err(AttemptError::Fatal)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let request = ChatRequest::new(&self.config.model, messages, config);
        debug!(
            target: PROVIDER_LOG_TARGET,
            "Sending {} messages to {}/{}",
            messages.len(),
            self.config.provider_name,
            self.config.model
        );

        let reply = self.send_with_retry(&request).await?;
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} returned no choices", self.config.provider_name))?;

        let response = LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            total_tokens: reply.usage.map(|u| u.total_tokens),
            finish_reason: choice.finish_reason,
            model: reply.model.unwrap_or_else(|| self.config.model.clone()),
        };
        debug!(
            target: PROVIDER_LOG_TARGET,
            "Reply: {} chars, finish_reason={:?}, tokens={:?}",
            response.content.len(),
            response.finish_reason,
            response.total_tokens
        );
        Ok(response)
    }

    async fn is_available(&self) -> bool {
        self.authorized(self.client.get(self.config.endpoint("models")))
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &[Message], config: &'a GenerationConfig) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            stop: config.stop.as_deref(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: usize,
}
