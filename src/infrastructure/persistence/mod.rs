//! Persistence adapters
//!
//! SQLite repositories for circles and settings, plus in-process stores that
//! implement the same ports.

mod circle_repository;
mod memory;
mod settings_repository;

pub use circle_repository::SqliteCircleRepository;
pub use memory::{InMemoryCircleRepository, InMemorySettingsRepository};
pub use settings_repository::SqliteSettingsRepository;

use crate::application::ports::outbound::RepositoryError;
use crate::domain::aggregates::{JourneyCircleAggregate, StepValue, WorkflowCheckpoint};
use crate::domain::entities::JourneyCircle;
use crate::domain::value_objects::{WizardStep, WorkflowPosition, WorkflowSettings};

/// Aggregate for a circle record that has no saved payload yet
///
/// Only the service area is known, so the wizard resumes right after step 2.
fn empty_aggregate(circle: JourneyCircle) -> Result<JourneyCircleAggregate, RepositoryError> {
    let mut aggregate =
        JourneyCircleAggregate::new(circle.client_id, WorkflowSettings::default().max_problems);
    aggregate
        .set(StepValue::ServiceArea(Some(circle.service_area_id)))
        .and_then(|_| aggregate.attach_circle(circle))
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    aggregate.set_checkpoint(WorkflowCheckpoint {
        position: WorkflowPosition::Step(WizardStep::ExistingAssets),
        highest_validated: Some(WizardStep::ServiceArea),
    });
    Ok(aggregate)
}
