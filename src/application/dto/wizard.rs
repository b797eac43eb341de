use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::entities::CircleStatus;
use crate::domain::services::{
    project, CircleProjection, PendingGeneration, StepValidation, WorkflowStateMachine,
};
use crate::domain::value_objects::{
    ClientId, JourneyCircleId, ServiceAreaId, SessionId, WizardStep, WorkflowPosition,
    WorkflowSettings,
};

/// Request body for opening a wizard session.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSessionRequestDto {
    pub client_id: ClientId,
    /// Resume the circle of this service area if one exists
    #[serde(default)]
    pub service_area_id: Option<ServiceAreaId>,
}

/// Request body for `jump`; the step is given by number (1-11) or by name.
#[derive(Debug, Clone, Deserialize)]
pub struct JumpRequestDto {
    #[serde(deserialize_with = "step_by_number_or_name")]
    pub step: WizardStep,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepRef {
    Number(u8),
    Name(WizardStep),
}

fn step_by_number_or_name<'de, D>(deserializer: D) -> Result<WizardStep, D::Error>
where
    D: Deserializer<'de>,
{
    match StepRef::deserialize(deserializer)? {
        StepRef::Name(step) => Ok(step),
        StepRef::Number(number) => WizardStep::from_number(number).ok_or_else(|| {
            de::Error::custom(format!("step must be between 1 and 11, got {}", number))
        }),
    }
}

/// Everything the UI needs to draw the current state of a session.
#[derive(Debug, Clone, Serialize)]
pub struct WizardViewModel {
    pub session_id: SessionId,
    pub circle_id: Option<JourneyCircleId>,
    pub status: CircleStatus,
    pub position: WorkflowPosition,
    pub step_title: Option<&'static str>,
    pub highest_validated: Option<WizardStep>,
    pub validation: StepValidation,
    pub pending: Option<PendingGeneration>,
    pub projection: CircleProjection,
    pub settings: WorkflowSettings,
    pub data: JourneyCircleAggregate,
}

impl WizardViewModel {
    pub fn build(session_id: SessionId, machine: &mut WorkflowStateMachine) -> Self {
        let validation = machine.validate_current();
        let circle = machine.circle();
        Self {
            session_id,
            circle_id: circle.circle().map(|c| c.id),
            status: circle
                .circle()
                .map(|c| c.status)
                .unwrap_or(CircleStatus::Incomplete),
            position: machine.position(),
            step_title: machine.position().step().map(|s| s.title()),
            highest_validated: machine.highest_validated(),
            validation,
            pending: machine.pending().cloned(),
            projection: project(circle),
            settings: machine.settings().clone(),
            data: circle.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_accepts_number_or_name() {
        let by_number: JumpRequestDto = serde_json::from_str(r#"{"step": 4}"#).unwrap();
        assert_eq!(by_number.step, WizardStep::Industries);
        let by_name: JumpRequestDto = serde_json::from_str(r#"{"step": "industries"}"#).unwrap();
        assert_eq!(by_name.step, WizardStep::Industries);

        assert!(serde_json::from_str::<JumpRequestDto>(r#"{"step": 12}"#).is_err());
        assert!(serde_json::from_str::<JumpRequestDto>(r#"{"step": 0}"#).is_err());
        assert!(serde_json::from_str::<JumpRequestDto>(r#"{"step": "nowhere"}"#).is_err());
    }
}
