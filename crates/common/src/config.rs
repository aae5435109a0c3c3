//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Emotion classifier configuration.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Text emotion classifier (Hugging Face Inference API).
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// When disabled every entry is classified as neutral.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inference endpoint base URL.
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,
    /// Model identifier.
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// API key. Requests are unauthenticated (lower rate limits) without it.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_classifier_endpoint(),
            model: default_classifier_model(),
            api_key: None,
            timeout_secs: default_classifier_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

fn default_classifier_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_classifier_model() -> String {
    "j-hartmann/emotion-english-distilroberta-base".to_string()
}

const fn default_classifier_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` in the working directory, if present
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `MOODLOG_ENV`)
    /// 4. Environment variables with `MOODLOG_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();

        let env = std::env::var("MOODLOG_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MOODLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MOODLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = config::Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("database.url", "postgres://localhost/moodlog")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.database.max_connections, 20);
        assert!(config.classifier.enabled);
        assert_eq!(
            config.classifier.model,
            "j-hartmann/emotion-english-distilroberta-base"
        );
        assert!(config.classifier.api_key.is_none());
        assert_eq!(config.classifier.timeout_secs, 30);
    }
}
