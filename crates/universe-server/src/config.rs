//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use universe_repository::StoreConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// LLM provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    #[serde(skip_serializing)]
    pub openrouter_api_key: Option<String>,

    /// Tried first, in order. `gemini*` models go to Gemini, the rest to OpenRouter.
    pub primary_models: Vec<String>,

    /// Tried after every primary model has failed
    pub fallback_models: Vec<String>,

    /// Outbound request timeout
    pub timeout_secs: u64,

    /// Attempts per model
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n × retry_backoff_ms`
    pub retry_backoff_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openrouter_api_key: None,
            primary_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
            ],
            fallback_models: vec![
                "mistralai/mistral-7b-instruct".to_string(),
                "meta-llama/llama-3.1-8b-instruct".to_string(),
            ],
            timeout_secs: 30,
            max_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Model used by the single-model question and flow generators: the
    /// first primary or fallback model that `servable` accepts
    pub fn default_model<F>(&self, servable: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.primary_models
            .iter()
            .chain(self.fallback_models.iter())
            .map(String::as_str)
            .find(|model| servable(model))
    }
}

/// Generation session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub ttl_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Include internal error detail in error responses
    pub dev_mode: bool,

    pub log_format: LogFormat,

    /// SQLite URL. Without one, projects live in memory.
    pub database_url: Option<String>,

    /// HS256 secret for bearer tokens
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    pub llm: LlmSettings,

    pub sessions: SessionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            log_format: LogFormat::Text,
            database_url: None,
            jwt_secret: None,
            llm: LlmSettings::default(),
            sessions: SessionSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config/server.*`, `UNIVERSE__`-prefixed
    /// environment variables and the plain provider/database variables
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(
                config::Environment::with_prefix("UNIVERSE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("llm.primary_models")
                    .with_list_parse_key("llm.fallback_models")
                    .try_parsing(true),
            )
            .build();

        let mut config: Self = match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))?,
            Err(e) => {
                tracing::info!(error = %e, "No usable config source, using default configuration");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply the conventional unprefixed variables on top of the loaded values
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.llm.gemini_api_key = Some(key);
        }
        if let Some(key) = lookup("OPENROUTER_API_KEY") {
            self.llm.openrouter_api_key = Some(key);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        match &self.database_url {
            Some(url) => StoreConfig::sqlite(url.clone()),
            None => StoreConfig::memory(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
