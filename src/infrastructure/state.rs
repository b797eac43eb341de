//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;

use crate::application::ports::outbound::{
    ContentGenerationPort, JourneyCircleRepositoryPort, SettingsRepositoryPort,
};
use crate::application::services::{GenerationService, SettingsService, WizardService};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::persistence::{
    InMemoryCircleRepository, InMemorySettingsRepository, SqliteCircleRepository,
    SqliteSettingsRepository,
};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub settings_service: Arc<SettingsService>,
    pub wizard_service: Arc<WizardService>,
    pub generation_service: GenerationService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let (circles, settings): (
            Arc<dyn JourneyCircleRepositoryPort>,
            Arc<dyn SettingsRepositoryPort>,
        ) = if config.uses_memory_store() {
            tracing::warn!("Using in-memory stores, circles will not survive a restart");
            (
                Arc::new(InMemoryCircleRepository::new()),
                Arc::new(InMemorySettingsRepository::new()),
            )
        } else {
            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect(&config.database_url)
                .await
                .with_context(|| format!("Failed to open database {}", config.database_url))?;
            (
                Arc::new(SqliteCircleRepository::new(pool.clone()).await?),
                Arc::new(SqliteSettingsRepository::new(pool).await?),
            )
        };

        let generator = Arc::new(OllamaClient::new(
            &config.ollama_base_url,
            &config.ollama_model,
        ));

        Ok(Self::from_ports(config, circles, settings, generator))
    }

    /// Wire the services over already constructed adapters
    pub fn from_ports(
        config: AppConfig,
        circles: Arc<dyn JourneyCircleRepositoryPort>,
        settings: Arc<dyn SettingsRepositoryPort>,
        generator: Arc<dyn ContentGenerationPort>,
    ) -> Self {
        let settings_service = Arc::new(SettingsService::new(settings));
        let wizard_service = Arc::new(WizardService::new(circles, settings_service.clone()));
        let generation_service = GenerationService::new(wizard_service.clone(), generator);

        Self {
            config,
            settings_service,
            wizard_service,
            generation_service,
        }
    }
}
