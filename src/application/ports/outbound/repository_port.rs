//! Repository port - Persistence of journey circles
//!
//! A circle is created once per service area; creation assigns the circle id.
//! The aggregate is then saved whole between wizard steps and loaded back by
//! service area when a session is reopened.

use async_trait::async_trait;

use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::entities::JourneyCircle;
use crate::domain::errors::WorkflowError;
use crate::domain::value_objects::{ClientId, ServiceAreaId};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("A journey circle already exists for service area {0}")]
    Duplicate(ServiceAreaId),
    #[error("Journey circle has not been created yet")]
    NotCreated,
}

impl From<RepositoryError> for WorkflowError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(_) | RepositoryError::NotCreated => {
                WorkflowError::IntegrityViolation(err.to_string())
            }
            RepositoryError::Database(_) | RepositoryError::Serialization(_) => {
                WorkflowError::ExternalService(err.to_string())
            }
        }
    }
}

#[async_trait]
pub trait JourneyCircleRepositoryPort: Send + Sync {
    /// Create the circle record for a service area
    ///
    /// Fails with `Duplicate` if the service area already has one.
    async fn create(
        &self,
        client_id: ClientId,
        service_area_id: ServiceAreaId,
    ) -> Result<JourneyCircle, RepositoryError>;

    /// Load the stored aggregate for a service area
    async fn load(
        &self,
        service_area_id: ServiceAreaId,
    ) -> Result<Option<JourneyCircleAggregate>, RepositoryError>;

    /// Store the whole aggregate under its circle id
    async fn save(&self, aggregate: &JourneyCircleAggregate) -> Result<(), RepositoryError>;
}
