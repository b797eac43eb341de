//! Application configuration

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite://journey_circle.db?mode=rwc";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
const DEFAULT_SERVER_PORT: i64 = 3000;

/// Database URL that selects the in-process stores instead of SQLite
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Application configuration loaded from `JOURNEY_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite connection URL, or `memory` for non-persistent stores
    pub database_url: String,

    /// Ollama API base URL (OpenAI-compatible)
    pub ollama_base_url: String,
    /// Model used for all generation requests
    pub ollama_model: String,

    /// HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix("JOURNEY"))
    }

    fn load(environment: config::Environment) -> Result<Self> {
        config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("ollama_base_url", DEFAULT_OLLAMA_BASE_URL)?
            .set_default("ollama_model", DEFAULT_OLLAMA_MODEL)?
            .set_default("server_port", DEFAULT_SERVER_PORT)?
            .add_source(environment.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("JOURNEY_* configuration is invalid")
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}
