//! Workflow errors
//!
//! Every command on a wizard session returns one of these instead of
//! panicking, so the session stays interactive after any failure.

use serde::Serialize;

use crate::domain::value_objects::WizardStep;

/// A single step rule that did not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    /// Stable machine-readable rule code
    pub rule: &'static str,
    /// User-facing diagnostic
    pub message: String,
}

impl RuleViolation {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Input does not satisfy a step rule; the user can correct it and retry
    #[error("{step} is not complete: {}", format_violations(.violations))]
    Validation {
        step: WizardStep,
        violations: Vec<RuleViolation>,
    },

    /// Navigation or command not allowed in the current state
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    /// Content generation or persistence failed; in-memory state is unchanged
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Mutation would break a structural invariant of the circle
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

impl WorkflowError {
    /// Validation failure for input rejected at the mutation boundary
    pub fn invalid_input(step: WizardStep, rule: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            step,
            violations: vec![RuleViolation::new(rule, message)],
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        WorkflowError::IntegrityViolation(message.into())
    }

    pub fn illegal(message: impl Into<String>) -> Self {
        WorkflowError::IllegalTransition(message.into())
    }
}

fn format_violations(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = WorkflowError::Validation {
            step: WizardStep::Industries,
            violations: vec![
                RuleViolation::new("a", "first problem"),
                RuleViolation::new("b", "second problem"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("step 4"));
        assert!(text.contains("first problem; second problem"));
    }
}
