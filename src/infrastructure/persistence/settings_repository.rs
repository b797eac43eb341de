use async_trait::async_trait;
use sqlx::SqlitePool;
use crate::application::ports::outbound::{SettingsRepositoryPort, SettingsError};
use crate::domain::value_objects::WorkflowSettings;

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        // Create table if not exists
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SettingsRepositoryPort for SqliteSettingsRepository {
    async fn get(&self) -> Result<WorkflowSettings, SettingsError> {
        let mut settings = WorkflowSettings::from_env(); // Start with env defaults

        // Override with DB values; unparsable rows keep the env value
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        for (key, value) in rows {
            match key.as_str() {
                "max_problems" => if let Ok(v) = value.parse() { settings.max_problems = v; },
                "offer_policy" => if let Ok(v) = value.parse() { settings.offer_policy = v; },
                "generation_timeout_secs" => if let Ok(v) = value.parse() { settings.generation_timeout_secs = v; },
                "max_suggestions" => if let Ok(v) = value.parse() { settings.max_suggestions = v; },
                _ => tracing::warn!(key = %key, "Ignoring unknown setting"),
            }
        }

        Ok(settings)
    }

    async fn save(&self, settings: &WorkflowSettings) -> Result<(), SettingsError> {
        let pairs = [
            ("max_problems", settings.max_problems.to_string()),
            ("offer_policy", settings.offer_policy.to_string()),
            ("generation_timeout_secs", settings.generation_timeout_secs.to_string()),
            ("max_suggestions", settings.max_suggestions.to_string()),
        ];

        for (key, value) in pairs {
            sqlx::query("INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await
                .map_err(|e| SettingsError::Database(e.to_string()))?;
        }

        Ok(())
    }

    async fn reset(&self) -> Result<WorkflowSettings, SettingsError> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(WorkflowSettings::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::OfferPolicy;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repository() -> SqliteSettingsRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteSettingsRepository::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_saved_values_override_defaults() {
        let repo = repository().await;
        let settings = WorkflowSettings {
            offer_policy: OfferPolicy::Optional,
            max_suggestions: 4,
            ..WorkflowSettings::from_env()
        };
        repo.save(&settings).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), settings);

        let reset = repo.reset().await.unwrap();
        assert_eq!(repo.get().await.unwrap(), reset);
    }
}
