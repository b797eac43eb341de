//! In-process stores
//!
//! Used when `JOURNEY_DATABASE_URL=memory`, and by the HTTP tests. Nothing
//! survives a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{
    JourneyCircleRepositoryPort, RepositoryError, SettingsError, SettingsRepositoryPort,
};
use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::entities::JourneyCircle;
use crate::domain::value_objects::{ClientId, JourneyCircleId, ServiceAreaId, WorkflowSettings};
use crate::infrastructure::persistence::empty_aggregate;

#[derive(Default)]
pub struct InMemoryCircleRepository {
    circles: RwLock<HashMap<ServiceAreaId, JourneyCircleAggregate>>,
    last_id: AtomicI64,
}

impl InMemoryCircleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JourneyCircleRepositoryPort for InMemoryCircleRepository {
    async fn create(
        &self,
        client_id: ClientId,
        service_area_id: ServiceAreaId,
    ) -> Result<JourneyCircle, RepositoryError> {
        let mut circles = self.circles.write().await;
        if circles.contains_key(&service_area_id) {
            return Err(RepositoryError::Duplicate(service_area_id));
        }
        let id = JourneyCircleId::new(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let circle = JourneyCircle::new(id, client_id, service_area_id);
        circles.insert(service_area_id, empty_aggregate(circle.clone())?);
        Ok(circle)
    }

    async fn load(
        &self,
        service_area_id: ServiceAreaId,
    ) -> Result<Option<JourneyCircleAggregate>, RepositoryError> {
        Ok(self.circles.read().await.get(&service_area_id).cloned())
    }

    async fn save(&self, aggregate: &JourneyCircleAggregate) -> Result<(), RepositoryError> {
        let circle = aggregate.circle().ok_or(RepositoryError::NotCreated)?;
        let mut circles = self.circles.write().await;
        match circles.get_mut(&circle.service_area_id) {
            Some(stored) => {
                *stored = aggregate.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotCreated),
        }
    }
}

pub struct InMemorySettingsRepository {
    settings: RwLock<Option<WorkflowSettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SettingsRepositoryPort for InMemorySettingsRepository {
    async fn get(&self) -> Result<WorkflowSettings, SettingsError> {
        Ok(self
            .settings
            .read()
            .await
            .clone()
            .unwrap_or_else(WorkflowSettings::from_env))
    }

    async fn save(&self, settings: &WorkflowSettings) -> Result<(), SettingsError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }

    async fn reset(&self) -> Result<WorkflowSettings, SettingsError> {
        *self.settings.write().await = None;
        Ok(WorkflowSettings::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_circle_lifecycle() {
        let repo = InMemoryCircleRepository::new();
        let circle = repo
            .create(ClientId::new(1), ServiceAreaId::new(5))
            .await
            .unwrap();
        assert_eq!(circle.id, JourneyCircleId::new(1));
        assert!(matches!(
            repo.create(ClientId::new(2), ServiceAreaId::new(5)).await,
            Err(RepositoryError::Duplicate(_))
        ));

        let loaded = repo.load(ServiceAreaId::new(5)).await.unwrap().unwrap();
        assert_eq!(loaded.circle().map(|c| c.id), Some(circle.id));
        repo.save(&loaded).await.unwrap();

        let detached = JourneyCircleAggregate::new(ClientId::new(1), 5);
        assert!(matches!(
            repo.save(&detached).await,
            Err(RepositoryError::NotCreated)
        ));
    }
}
