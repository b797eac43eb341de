//! Offer entity - Concrete offers mapped onto a solution

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{OfferId, SolutionId, WebAddress};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub solution_id: SolutionId,
    pub title: String,
    pub url: WebAddress,
    pub description: String,
}

impl Offer {
    pub fn new(id: OfferId, solution_id: SolutionId, title: impl Into<String>, url: WebAddress) -> Self {
        Self {
            id,
            solution_id,
            title: title.into(),
            url,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
