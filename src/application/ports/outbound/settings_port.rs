use async_trait::async_trait;

use crate::domain::value_objects::WorkflowSettings;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait SettingsRepositoryPort: Send + Sync {
    async fn get(&self) -> Result<WorkflowSettings, SettingsError>;
    async fn save(&self, settings: &WorkflowSettings) -> Result<(), SettingsError>;
    async fn reset(&self) -> Result<WorkflowSettings, SettingsError>;
}
