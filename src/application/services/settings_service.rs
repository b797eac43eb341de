use std::sync::Arc;
use tokio::sync::RwLock;
use crate::application::ports::outbound::{SettingsRepositoryPort, SettingsError};
use crate::domain::value_objects::WorkflowSettings;

pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryPort>,
    cache: RwLock<Option<WorkflowSettings>>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryPort>) -> Self {
        Self {
            repository,
            cache: RwLock::new(None),
        }
    }

    /// Get current settings (cached)
    pub async fn get(&self) -> WorkflowSettings {
        let cache = self.cache.read().await;
        if let Some(settings) = &*cache {
            return settings.clone();
        }
        drop(cache);

        // Load from DB
        match self.repository.get().await {
            Ok(settings) => {
                *self.cache.write().await = Some(settings.clone());
                settings
            }
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to environment settings");
                WorkflowSettings::from_env()
            }
        }
    }

    /// Validate, store and cache new settings
    pub async fn update(&self, settings: WorkflowSettings) -> Result<(), SettingsError> {
        Self::validate(&settings)?;
        self.repository.save(&settings).await?;
        *self.cache.write().await = Some(settings);
        Ok(())
    }

    /// Reset to env/defaults and clear DB values
    pub async fn reset(&self) -> Result<WorkflowSettings, SettingsError> {
        let settings = self.repository.reset().await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }

    fn validate(settings: &WorkflowSettings) -> Result<(), SettingsError> {
        if settings.max_problems == 0 {
            return Err(SettingsError::Invalid("max_problems must be at least 1".into()));
        }
        if settings.generation_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "generation_timeout_secs must be at least 1".into(),
            ));
        }
        if settings.max_suggestions == 0 {
            return Err(SettingsError::Invalid("max_suggestions must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::OfferPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSettingsRepository {
        stored: Mutex<Option<WorkflowSettings>>,
        reads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SettingsRepositoryPort for MockSettingsRepository {
        async fn get(&self) -> Result<WorkflowSettings, SettingsError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, settings: &WorkflowSettings) -> Result<(), SettingsError> {
            *self.stored.lock().unwrap() = Some(settings.clone());
            Ok(())
        }

        async fn reset(&self) -> Result<WorkflowSettings, SettingsError> {
            *self.stored.lock().unwrap() = None;
            Ok(WorkflowSettings::default())
        }
    }

    #[tokio::test]
    async fn test_get_is_cached() {
        let repository = Arc::new(MockSettingsRepository::default());
        let service = SettingsService::new(repository.clone());
        service.get().await;
        service.get().await;
        assert_eq!(repository.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_then_reset() {
        let repository = Arc::new(MockSettingsRepository::default());
        let service = SettingsService::new(repository.clone());

        let relaxed = WorkflowSettings {
            offer_policy: OfferPolicy::Optional,
            ..WorkflowSettings::default()
        };
        service.update(relaxed.clone()).await.unwrap();
        assert_eq!(service.get().await, relaxed);
        assert_eq!(repository.stored.lock().unwrap().clone(), Some(relaxed));

        let reset = service.reset().await.unwrap();
        assert_eq!(reset.offer_policy, OfferPolicy::Required);
        assert_eq!(service.get().await, reset);
    }

    #[tokio::test]
    async fn test_update_rejects_zero_limits() {
        let service = SettingsService::new(Arc::new(MockSettingsRepository::default()));
        let broken = WorkflowSettings {
            max_problems: 0,
            ..WorkflowSettings::default()
        };
        assert!(matches!(
            service.update(broken).await,
            Err(SettingsError::Invalid(_))
        ));
    }
}
