//! Solution entity - Middle ring, one per problem

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ProblemId, SolutionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub title: String,
    pub description: String,
}

impl Solution {
    pub fn new(id: SolutionId, problem_id: ProblemId, title: impl Into<String>) -> Self {
        Self {
            id,
            problem_id,
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
