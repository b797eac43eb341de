//! SQLite journey circle repository
//!
//! One row per circle. The aggregate is stored as a JSON payload; the columns
//! next to it exist for lookups and for the one-circle-per-service-area
//! constraint.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{JourneyCircleRepositoryPort, RepositoryError};
use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::entities::{CircleStatus, JourneyCircle};
use crate::domain::value_objects::{ClientId, JourneyCircleId, ServiceAreaId};
use crate::infrastructure::persistence::empty_aggregate;

pub struct SqliteCircleRepository {
    pool: SqlitePool,
}

impl SqliteCircleRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS journey_circles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id INTEGER NOT NULL,
                service_area_id INTEGER NOT NULL UNIQUE,
                status TEXT NOT NULL,
                payload TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

#[async_trait]
impl JourneyCircleRepositoryPort for SqliteCircleRepository {
    async fn create(
        &self,
        client_id: ClientId,
        service_area_id: ServiceAreaId,
    ) -> Result<JourneyCircle, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO journey_circles (client_id, service_area_id, status) VALUES (?, ?, ?)",
        )
        .bind(client_id.get())
        .bind(service_area_id.get())
        .bind(CircleStatus::Incomplete.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(service_area_id)
            }
            _ => database_error(e),
        })?;

        let id = JourneyCircleId::new(result.last_insert_rowid());
        tracing::debug!(circle_id = %id, %service_area_id, "Inserted journey circle");
        Ok(JourneyCircle::new(id, client_id, service_area_id))
    }

    async fn load(
        &self,
        service_area_id: ServiceAreaId,
    ) -> Result<Option<JourneyCircleAggregate>, RepositoryError> {
        let row: Option<(i64, i64, String, Option<String>)> = sqlx::query_as(
            "SELECT id, client_id, status, payload FROM journey_circles WHERE service_area_id = ?",
        )
        .bind(service_area_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        let Some((id, client_id, status, payload)) = row else {
            return Ok(None);
        };

        match payload {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
            None => {
                let mut circle = JourneyCircle::new(
                    JourneyCircleId::new(id),
                    ClientId::new(client_id),
                    service_area_id,
                );
                circle.status = status
                    .parse()
                    .map_err(RepositoryError::Serialization)?;
                empty_aggregate(circle).map(Some)
            }
        }
    }

    async fn save(&self, aggregate: &JourneyCircleAggregate) -> Result<(), RepositoryError> {
        let circle = aggregate.circle().ok_or(RepositoryError::NotCreated)?;
        let payload = serde_json::to_string(aggregate)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE journey_circles SET status = ?, payload = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(circle.status.to_string())
        .bind(payload)
        .bind(circle.id.get())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotCreated);
        }
        Ok(())
    }
}
