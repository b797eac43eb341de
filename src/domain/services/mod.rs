//! Domain services - Pure business logic operations over the circle

pub mod circle_projector;
pub mod step_validators;
pub mod workflow_state_machine;

pub use circle_projector::{project, CircleProjection};
pub use step_validators::StepValidation;
pub use workflow_state_machine::{DraftDecision, PendingGeneration, WorkflowStateMachine};
