//! Wizard steps and the workflow position built from them

use serde::{Deserialize, Serialize};

/// One of the eleven steps of the journey circle wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BrainContent,
    ServiceArea,
    ExistingAssets,
    Industries,
    PrimaryProblem,
    ProblemTitles,
    Solutions,
    Offers,
    Assets,
    Publish,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 11] = [
        WizardStep::BrainContent,
        WizardStep::ServiceArea,
        WizardStep::ExistingAssets,
        WizardStep::Industries,
        WizardStep::PrimaryProblem,
        WizardStep::ProblemTitles,
        WizardStep::Solutions,
        WizardStep::Offers,
        WizardStep::Assets,
        WizardStep::Publish,
        WizardStep::Review,
    ];

    pub const FIRST: WizardStep = WizardStep::BrainContent;
    pub const LAST: WizardStep = WizardStep::Review;

    /// 1-based step number as shown in the wizard
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(number: u8) -> Option<Self> {
        if number == 0 {
            return None;
        }
        Self::ALL.get(usize::from(number - 1)).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::BrainContent => "Brain Content",
            WizardStep::ServiceArea => "Service Area",
            WizardStep::ExistingAssets => "Existing Assets",
            WizardStep::Industries => "Industries",
            WizardStep::PrimaryProblem => "Primary Problem",
            WizardStep::ProblemTitles => "Problem Titles",
            WizardStep::Solutions => "Solutions",
            WizardStep::Offers => "Offers",
            WizardStep::Assets => "Assets",
            WizardStep::Publish => "Publish",
            WizardStep::Review => "Review",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// Where a session currently is: on a step, or past the last one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum WorkflowPosition {
    Step(WizardStep),
    Complete,
}

impl WorkflowPosition {
    pub fn step(self) -> Option<WizardStep> {
        match self {
            WorkflowPosition::Step(step) => Some(step),
            WorkflowPosition::Complete => None,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, WorkflowPosition::Complete)
    }
}

impl std::fmt::Display for WorkflowPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPosition::Step(step) => step.fmt(f),
            WorkflowPosition::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_numbers_round_trip() {
        for (index, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(step.number() as usize, index + 1);
            assert_eq!(WizardStep::from_number(step.number()), Some(*step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(12), None);
    }

    #[test]
    fn test_step_neighbours() {
        assert_eq!(WizardStep::FIRST.previous(), None);
        assert_eq!(WizardStep::LAST.next(), None);
        assert_eq!(
            WizardStep::PrimaryProblem.next(),
            Some(WizardStep::ProblemTitles)
        );
        assert_eq!(
            WizardStep::PrimaryProblem.previous(),
            Some(WizardStep::Industries)
        );
    }
}
