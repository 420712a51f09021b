use crate::llm_provider::*;
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use anyhow::{anyhow, Result};
use recipegraph_core::config_manager::{ConfigError, LLMConfig};
use std::sync::Arc;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration.
    ///
    /// Missing settings surface as a [`ConfigError`] inside the returned
    /// error so callers can tell configuration problems from transport ones.
    pub fn create_from_config(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let compat_config = Self::resolve(config)?;
        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }

    /// Resolve the preset for the configured provider.
    pub fn resolve(config: &LLMConfig) -> Result<OpenAICompatibleConfig> {
        let provider_name = config.provider.to_lowercase();

        let mut compat_config = match provider_name.as_str() {
            "openai" => OpenAICompatibleConfig::openai(
                Self::model(config, Some("gpt-4o-mini"))?,
                Self::api_key(config, "openai")?,
            ),
            "huggingface" => OpenAICompatibleConfig::huggingface(
                Self::model(config, None)?,
                Self::api_key(config, "huggingface")?,
            ),
            "ollama" => OpenAICompatibleConfig::ollama(Self::model(config, Some("llama3.1:8b"))?),
            "lmstudio" => OpenAICompatibleConfig::lm_studio(Self::model(config, Some("local-model"))?),
            "openai-compatible" => {
                let base_url = config.base_url.clone().ok_or_else(|| {
                    anyhow!(ConfigError::ValidationError(
                        "OpenAI-compatible base URL not found. Set 'llm.base_url' or RECIPEGRAPH_BASE_URL"
                            .to_string()
                    ))
                })?;
                OpenAICompatibleConfig::custom(
                    base_url,
                    Self::model(config, None)?,
                    "openai-compatible".to_string(),
                )
            }
            _ => {
                return Err(anyhow!(ConfigError::ValidationError(format!(
                    "Unsupported LLM provider: {}. Available providers: {}",
                    provider_name,
                    Self::supported_providers().join(", ")
                ))))
            }
        };

        if let Some(base_url) = &config.base_url {
            compat_config.base_url = base_url.clone();
        }
        if compat_config.api_key.is_none() {
            compat_config.api_key = config.api_key.clone();
        }
        compat_config.timeout_secs = config.timeout_secs;
        compat_config.max_retries = config.max_retries;

        Ok(compat_config)
    }

    fn model(config: &LLMConfig, fallback: Option<&str>) -> Result<String> {
        config
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| fallback.map(str::to_string))
            .ok_or_else(|| {
                anyhow!(ConfigError::ModelNotFound(format!(
                    "no model configured for provider '{}'. Set 'llm.model' or RECIPEGRAPH_MODEL/HF_MODEL",
                    config.provider
                )))
            })
    }

    fn api_key(config: &LLMConfig, provider: &str) -> Result<String> {
        config.api_key.clone().ok_or_else(|| {
            anyhow!(ConfigError::ValidationError(format!(
                "{} API key not found. Set 'llm.api_key' or RECIPEGRAPH_API_KEY/HF_TOKEN/OPENAI_API_KEY",
                provider
            )))
        })
    }

    /// Check if the provider answers
    pub async fn check_availability(provider: &Arc<dyn LLMProvider>) -> bool {
        provider.is_available().await
    }

    pub fn supported_providers() -> Vec<&'static str> {
        vec!["openai", "huggingface", "ollama", "lmstudio", "openai-compatible"]
    }
}
