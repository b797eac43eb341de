//! Journey circle entity - Root record of a problem/solution/offer structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ClientId, JourneyCircleId, ServiceAreaId};

/// Completion state of a circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleStatus {
    Incomplete,
    Complete,
}

impl std::fmt::Display for CircleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircleStatus::Incomplete => write!(f, "incomplete"),
            CircleStatus::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for CircleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(CircleStatus::Incomplete),
            "complete" => Ok(CircleStatus::Complete),
            other => Err(format!("unknown circle status: {}", other)),
        }
    }
}

/// A journey circle - one per service area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyCircle {
    pub id: JourneyCircleId,
    pub client_id: ClientId,
    /// Fixed once the circle exists
    pub service_area_id: ServiceAreaId,
    pub status: CircleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JourneyCircle {
    pub fn new(id: JourneyCircleId, client_id: ClientId, service_area_id: ServiceAreaId) -> Self {
        let now = Utc::now();
        Self {
            id,
            client_id,
            service_area_id,
            status: CircleStatus::Incomplete,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
