//! Content generation requests and results
//!
//! These cross the content-generation port. The context is structured data
//! only; turning it into a prompt is the adapter's concern.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AssetDraftId, ProblemId, ServiceAreaId};

/// Kind of content asked of the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    ProblemTitles,
    SolutionTitles,
    AssetOutline,
    AssetContent,
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GenerationKind::ProblemTitles => "problem_titles",
            GenerationKind::SolutionTitles => "solution_titles",
            GenerationKind::AssetOutline => "asset_outline",
            GenerationKind::AssetContent => "asset_content",
        };
        f.write_str(name)
    }
}

/// What the user asked to generate, and for which target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    ProblemTitles,
    SolutionTitles { problem_id: ProblemId },
    AssetOutline { draft_id: AssetDraftId },
    AssetContent { draft_id: AssetDraftId },
}

impl GenerationRequest {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationRequest::ProblemTitles => GenerationKind::ProblemTitles,
            GenerationRequest::SolutionTitles { .. } => GenerationKind::SolutionTitles,
            GenerationRequest::AssetOutline { .. } => GenerationKind::AssetOutline,
            GenerationRequest::AssetContent { .. } => GenerationKind::AssetContent,
        }
    }
}

/// Brain content as handed to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMaterial {
    pub kind: String,
    pub title: String,
    pub value: String,
}

/// Structured input for one generation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    pub service_area_id: Option<ServiceAreaId>,
    pub industries: Vec<i64>,
    pub brain_content: Vec<SourceMaterial>,
    /// Problem titles already in the circle, in position order
    pub problems: Vec<String>,
    /// Titles already confirmed, which the generator should not repeat
    pub confirmed_titles: Vec<String>,
    /// Problem or solution the content is about
    pub focus: Option<String>,
    /// Asset title when generating an outline or content
    pub asset_title: Option<String>,
    /// Approved outline when generating content
    pub outline: Option<String>,
    pub max_titles: usize,
}

/// Result returned by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeneratedDraft {
    Titles(Vec<String>),
    Outline(String),
    Content(String),
}

/// Handle for one in-flight generation; a result is applied only if its
/// ticket is still the pending one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationTicket(u64);

impl GenerationTicket {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for GenerationTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
