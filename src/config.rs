use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::utils::text_file::{load_text_file_with_guess_encoding, substitute_env_vars};

/// Prefix for environment overrides, e.g. `TEXT3D__LLM_CONFIG__MODEL`.
pub const ENV_PREFIX: &str = "TEXT3D";

/// Legacy variable holding the service credential.
pub const API_KEY_ENV: &str = "API_KEY";

const DEFAULT_CONFIG_PATHS: &[&str] = &["conf.yaml", "config/conf.yaml", "conf.json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub llm_config: LlmConfig,
    #[serde(default)]
    pub retry_config: RetryConfig,
    #[serde(default)]
    pub agent_config: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions idle for longer than this are evicted.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12393
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    256
}

fn default_eviction_interval_secs() -> u64 {
    60
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

/// Configuration for the OpenAI-compatible text-generation service
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Empty means the provider's default endpoint.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "siliconflow_llm".to_string()
}

fn default_model() -> String {
    "deepseek-ai/DeepSeek-V3".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: String::new(),
            model: default_model(),
            llm_api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("llm_api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Upper bound on one dispatch including all backoff waits.
    pub timeout_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub history_capacity: usize,
    /// YAML or JSON file replacing the built-in glossary and categories.
    pub vocabulary_path: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_capacity: 64,
            vocabulary_path: None,
        }
    }
}

impl Config {
    /// Paths tried in order: explicit argument, `CONFIG_PATH`, then the
    /// usual locations next to the working directory.
    pub fn candidate_paths(explicit: Option<&str>) -> Vec<String> {
        vec![
            explicit.map(|s| s.to_string()),
            std::env::var("CONFIG_PATH").ok(),
        ]
        .into_iter()
        .flatten()
        .chain(DEFAULT_CONFIG_PATHS.iter().map(|s| s.to_string()))
        .collect()
    }

    /// Load configuration and require an API key.
    ///
    /// An explicit path that does not exist is an error; when no default
    /// location exists the defaults plus environment overrides are used.
    pub fn load(explicit: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !Path::new(path).exists() {
                return Err(ConfigError::NotFound(vec![path.to_string()]));
            }
        }

        let found = Self::candidate_paths(explicit)
            .into_iter()
            .find(|p| Path::new(p).is_file());

        let mut config = match found {
            Some(path) => {
                let config = Self::from_file(Path::new(&path), ENV_PREFIX)?;
                info!("Loaded configuration from: {}", path);
                config
            }
            None => {
                info!("No config file found, using defaults and environment");
                Self::from_content(None, ENV_PREFIX)?
            }
        };

        config.resolve_api_key(std::env::var(API_KEY_ENV).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path, env_prefix: &str) -> Result<Self, ConfigError> {
        let content = load_text_file_with_guess_encoding(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let content = substitute_env_vars(&content);

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let format = if is_json { FileFormat::Json } else { FileFormat::Yaml };

        Self::from_content(Some((&content, format)), env_prefix)
    }

    /// Layer defaults, optional file content and environment overrides.
    fn from_content(
        content: Option<(&str, FileFormat)>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some((text, format)) = content {
            builder = builder.add_source(File::from_str(text, format));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Fill the key from the legacy variable when the file left it empty.
    /// A missing key is fatal.
    pub fn resolve_api_key(&mut self, fallback: Option<String>) -> Result<(), ConfigError> {
        if self.llm_config.llm_api_key.trim().is_empty() {
            if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
                self.llm_config.llm_api_key = key;
            }
        }
        if self.llm_config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}
