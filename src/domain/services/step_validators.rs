//! Step validators - Pure completion rules for each wizard step
//!
//! A validator never mutates the circle. It reports every violated rule so
//! the UI can show all diagnostics at once.

use serde::Serialize;

use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::errors::{RuleViolation, WorkflowError};
use crate::domain::value_objects::{OfferPolicy, WizardStep, WorkflowSettings};

/// Outcome of validating one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepValidation {
    pub step: WizardStep,
    pub violations: Vec<RuleViolation>,
}

impl StepValidation {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), WorkflowError> {
        if self.passed() {
            Ok(())
        } else {
            Err(WorkflowError::Validation {
                step: self.step,
                violations: self.violations,
            })
        }
    }
}

/// Run the rule set of `step` against the circle
pub fn validate_step(
    step: WizardStep,
    circle: &JourneyCircleAggregate,
    settings: &WorkflowSettings,
) -> StepValidation {
    let violations = match step {
        WizardStep::BrainContent
        | WizardStep::ExistingAssets
        | WizardStep::Publish
        | WizardStep::Review => Vec::new(),
        WizardStep::ServiceArea => service_area_rules(circle),
        WizardStep::Industries => industry_rules(circle),
        WizardStep::PrimaryProblem => primary_problem_rules(circle),
        WizardStep::ProblemTitles => {
            check_problem_count(circle.problem_count(), settings.max_problems)
                .into_iter()
                .collect()
        }
        WizardStep::Solutions => solution_rules(circle),
        WizardStep::Offers => offer_rules(circle, settings.offer_policy),
        WizardStep::Assets => asset_rules(circle),
    };
    StepValidation { step, violations }
}

fn service_area_rules(circle: &JourneyCircleAggregate) -> Vec<RuleViolation> {
    if circle.service_area_id().is_none() {
        vec![RuleViolation::new(
            "service_area_required",
            "Select or create a service area",
        )]
    } else {
        Vec::new()
    }
}

fn industry_rules(circle: &JourneyCircleAggregate) -> Vec<RuleViolation> {
    if circle.industries().is_empty() {
        vec![RuleViolation::new(
            "industry_required",
            "Select at least one industry",
        )]
    } else {
        Vec::new()
    }
}

fn primary_problem_rules(circle: &JourneyCircleAggregate) -> Vec<RuleViolation> {
    let primaries = circle.problems().iter().filter(|p| p.is_primary).count();
    match primaries {
        1 => Vec::new(),
        0 => vec![RuleViolation::new(
            "primary_problem_required",
            "Mark one problem as the primary problem",
        )],
        n => vec![RuleViolation::new(
            "primary_problem_unique",
            format!("Only one problem can be primary ({} are marked)", n),
        )],
    }
}

/// Exactly `required` problems; both fewer and more are rejected
pub fn check_problem_count(count: usize, required: usize) -> Option<RuleViolation> {
    if count == required {
        return None;
    }
    Some(RuleViolation::new(
        "problem_count",
        format!(
            "Select exactly {} problem titles ({} selected)",
            required, count
        ),
    ))
}

fn solution_rules(circle: &JourneyCircleAggregate) -> Vec<RuleViolation> {
    let problems = circle.problems();
    if problems.is_empty() {
        return vec![RuleViolation::new(
            "solutions_need_problems",
            "Add problems before mapping solutions",
        )];
    }
    problems
        .iter()
        .filter(|p| circle.solution_for(p.id).is_none())
        .map(|p| {
            RuleViolation::new(
                "solution_required",
                format!("Problem '{}' needs a solution", p.title),
            )
        })
        .collect()
}

fn offer_rules(circle: &JourneyCircleAggregate, policy: OfferPolicy) -> Vec<RuleViolation> {
    if policy == OfferPolicy::Optional {
        return Vec::new();
    }
    circle
        .solutions()
        .filter(|s| circle.offers_for(s.id).is_empty())
        .map(|s| {
            RuleViolation::new(
                "offer_required",
                format!("Solution '{}' needs at least one offer", s.title),
            )
        })
        .collect()
}

fn asset_rules(circle: &JourneyCircleAggregate) -> Vec<RuleViolation> {
    if circle.drafts().any(|d| d.is_approved()) {
        Vec::new()
    } else {
        vec![RuleViolation::new(
            "approved_asset_required",
            "Approve at least one asset",
        )]
    }
}
