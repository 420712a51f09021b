use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// Main configuration for RecipeGraph
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecipeGraphConfig {
    /// Language model used by both passes
    #[serde(default)]
    pub llm: LLMConfig,

    /// Extraction pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Graph layout and theme
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider: "openai", "huggingface", "ollama", "lmstudio", "openai-compatible"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Model identifier, e.g. "Qwen/Qwen2.5-72B-Instruct" or "llama3.1:8b"
    #[serde(default)]
    pub model: Option<String>,

    /// API key for hosted providers
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the preset base URL of the provider
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Step budget of the linking agent
    #[serde(default = "default_agent_max_steps")]
    pub agent_max_steps: usize,

    /// Fill in basic actions from the verb lexicon when the model returns none
    #[serde(default)]
    pub derive_basic_actions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            agent_max_steps: default_agent_max_steps(),
            derive_basic_actions: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_layout_iterations")]
    pub iterations: usize,

    #[serde(default = "default_damping")]
    pub damping: f64,

    #[serde(default = "default_repulsion")]
    pub repulsion: f64,

    #[serde(default = "default_attraction")]
    pub attraction: f64,

    /// Lower bound for node distance in the repulsion term
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,

    /// None = detect from RECIPEGRAPH_THEME
    #[serde(default)]
    pub dark_mode: Option<bool>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            iterations: default_layout_iterations(),
            damping: default_damping(),
            repulsion: default_repulsion(),
            attraction: default_attraction(),
            min_distance: default_min_distance(),
            dark_mode: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Allow recipe text and model output in logs
    #[serde(default)]
    pub allow_user_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            allow_user_data: false,
        }
    }
}

// Default value functions
fn default_llm_provider() -> String {
    "huggingface".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> usize {
    4096
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}
fn default_agent_max_steps() -> usize {
    10
}
fn default_layout_iterations() -> usize {
    50
}
fn default_damping() -> f64 {
    0.1
}
fn default_repulsion() -> f64 {
    0.1
}
fn default_attraction() -> f64 {
    0.02
}
fn default_min_distance() -> f64 {
    0.1
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

const PROVIDERS: &[&str] = &[
    "openai",
    "huggingface",
    "ollama",
    "lmstudio",
    "openai-compatible",
];

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1"
}

/// Configuration manager: defaults, config file, then environment
pub struct ConfigManager {
    config: RecipeGraphConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.recipegraph.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading RecipeGraph configuration");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match &config_path {
            Some(path) => info!("Config file: {}", path.display()),
            None => info!("Config file: NONE (using defaults)"),
        }
        info!(
            "LLM provider: {} (model: {:?})",
            config.llm.provider, config.llm.model
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load an explicit config file, still honouring environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::apply_env_overrides(Self::read_toml_file(path)?);
        Self::validate_config(&config)?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    pub fn from_config(config: RecipeGraphConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".recipegraph.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .recipegraph.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.recipegraph.toml
    /// 2. ~/.recipegraph/config.toml
    /// 3. defaults
    fn load_config_file() -> Result<(RecipeGraphConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".recipegraph.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".recipegraph").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((RecipeGraphConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<RecipeGraphConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(config: RecipeGraphConfig) -> RecipeGraphConfig {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Overrides read through `lookup` so they can be exercised without
    /// touching the process environment.
    pub fn apply_overrides_from<F>(mut config: RecipeGraphConfig, lookup: F) -> RecipeGraphConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(key));

        if let Some(provider) = first(&["RECIPEGRAPH_LLM_PROVIDER"]) {
            config.llm.provider = provider;
        }
        if let Some(model) = first(&["RECIPEGRAPH_MODEL", "HF_MODEL"]) {
            config.llm.model = Some(model);
        }
        if let Some(key) = first(&["RECIPEGRAPH_API_KEY", "HF_TOKEN", "OPENAI_API_KEY"]) {
            config.llm.api_key = Some(key);
        }
        if let Some(url) = first(&["RECIPEGRAPH_BASE_URL"]) {
            config.llm.base_url = Some(url);
        }
        if let Some(steps) = first(&["RECIPEGRAPH_AGENT_MAX_STEPS"]) {
            match steps.parse() {
                Ok(steps) => config.pipeline.agent_max_steps = steps,
                Err(_) => warn!("Ignoring non-numeric RECIPEGRAPH_AGENT_MAX_STEPS={}", steps),
            }
        }
        if let Some(theme) = first(&["RECIPEGRAPH_THEME"]) {
            config.graph.dark_mode = Some(theme.to_lowercase().contains("dark"));
        }

        if let Some(allow) = first(&["RB_ALLOW_USER_DATA_LOGS"]) {
            config.logging.allow_user_data = parse_flag(&allow);
        }
        if let Some(level) = first(&["RUST_LOG"]) {
            config.logging.level = level;
        }

        config
    }

    fn validate_config(config: &RecipeGraphConfig) -> Result<(), ConfigError> {
        if !PROVIDERS.contains(&config.llm.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid LLM provider: {}. Must be one of: {}",
                config.llm.provider,
                PROVIDERS.join(", ")
            )));
        }

        if config.pipeline.agent_max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.agent_max_steps must be at least 1".to_string(),
            ));
        }

        if config.graph.min_distance <= 0.0 {
            return Err(ConfigError::ValidationError(
                "graph.min_distance must be positive".to_string(),
            ));
        }

        match config.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn config(&self) -> &RecipeGraphConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = RecipeGraphConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RecipeGraphConfig::default();
        assert_eq!(config.llm.provider, "huggingface");
        assert_eq!(config.pipeline.agent_max_steps, 10);
        assert_eq!(config.graph.iterations, 50);
        assert!(!config.logging.allow_user_data);
    }

    #[test]
    fn test_config_validation() {
        let config = RecipeGraphConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_provider = config.clone();
        bad_provider.llm.provider = "invalid".to_string();
        assert!(ConfigManager::validate_config(&bad_provider).is_err());

        let mut no_steps = config.clone();
        no_steps.pipeline.agent_max_steps = 0;
        assert!(matches!(
            ConfigManager::validate_config(&no_steps),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HF_MODEL", "Qwen/Qwen2.5-72B-Instruct"),
            ("HF_TOKEN", "hf_secret"),
            ("OPENAI_API_KEY", "sk-ignored"),
            ("RECIPEGRAPH_AGENT_MAX_STEPS", "4"),
            ("RB_ALLOW_USER_DATA_LOGS", "TRUE"),
        ]
        .into_iter()
        .collect();

        let config = ConfigManager::apply_overrides_from(RecipeGraphConfig::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.llm.model.as_deref(), Some("Qwen/Qwen2.5-72B-Instruct"));
        assert_eq!(config.llm.api_key.as_deref(), Some("hf_secret"));
        assert_eq!(config.pipeline.agent_max_steps, 4);
        assert!(config.logging.allow_user_data);
    }

    #[test]
    fn test_invalid_step_override_is_ignored() {
        let config = ConfigManager::apply_overrides_from(RecipeGraphConfig::default(), |key| {
            (key == "RECIPEGRAPH_AGENT_MAX_STEPS").then(|| "many".to_string())
        });
        assert_eq!(config.pipeline.agent_max_steps, 10);
    }
}
