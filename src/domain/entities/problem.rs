//! Problem entity - Outer ring of the journey circle

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProblemId;

/// A problem the service area addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    /// 0-based ordering within the circle
    pub position: usize,
    pub is_primary: bool,
}

impl Problem {
    pub fn new(id: ProblemId, title: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            position,
            is_primary: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
