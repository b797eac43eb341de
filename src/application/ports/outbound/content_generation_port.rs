//! Content generation port - Interface to the AI text generator
//!
//! The generator receives a kind and structured context and returns a draft
//! of the matching shape. It is never called with the session locked.

use async_trait::async_trait;

use crate::domain::errors::WorkflowError;
use crate::domain::value_objects::{GeneratedDraft, GenerationContext, GenerationKind};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),
    #[error("Generator API error: {0}")]
    Api(String),
    #[error("Unusable generator response: {0}")]
    InvalidResponse(String),
}

impl From<GenerationError> for WorkflowError {
    fn from(err: GenerationError) -> Self {
        WorkflowError::ExternalService(err.to_string())
    }
}

#[async_trait]
pub trait ContentGenerationPort: Send + Sync {
    async fn generate(
        &self,
        kind: GenerationKind,
        context: &GenerationContext,
    ) -> Result<GeneratedDraft, GenerationError>;
}
