//! Asset draft entity - AI-generated content moving through approval gates
//!
//! ```text
//! none -> outline_pending -> outline_ready -(approve outline)-> content_pending
//!      -> content_ready -(approve content)-> approved -> published
//! ```
//!
//! Each AI output stops at a `*_ready` state until the user approves or
//! rejects it. Rejecting returns the draft to the last stable state so it can
//! be regenerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{WorkflowError, WorkflowResult};
use crate::domain::value_objects::{AssetDraftId, ProblemId, SolutionId};

/// What an asset is written about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AssetTarget {
    Problem(ProblemId),
    Solution(SolutionId),
}

/// Lifecycle state, ordered from least to most advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    None,
    OutlinePending,
    OutlineReady,
    ContentPending,
    ContentReady,
    Approved,
    Published,
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DraftState::None => "none",
            DraftState::OutlinePending => "outline_pending",
            DraftState::OutlineReady => "outline_ready",
            DraftState::ContentPending => "content_pending",
            DraftState::ContentReady => "content_ready",
            DraftState::Approved => "approved",
            DraftState::Published => "published",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDraft {
    pub id: AssetDraftId,
    pub target: AssetTarget,
    pub title: String,
    pub state: DraftState,
    pub outline: Option<String>,
    pub outline_approved: bool,
    pub content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AssetDraft {
    pub fn new(id: AssetDraftId, target: AssetTarget, title: impl Into<String>) -> Self {
        Self {
            id,
            target,
            title: title.into(),
            state: DraftState::None,
            outline: None,
            outline_approved: false,
            content: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.state >= DraftState::Approved
    }

    /// Enter `outline_pending`. A ready outline that has not been approved
    /// may be regenerated.
    pub fn begin_outline(&mut self) -> WorkflowResult<()> {
        match self.state {
            DraftState::None => {}
            DraftState::OutlineReady if !self.outline_approved => {}
            _ => return Err(self.illegal("request an outline")),
        }
        self.set_state(DraftState::OutlinePending);
        Ok(())
    }

    pub fn receive_outline(&mut self, outline: String) -> WorkflowResult<()> {
        if self.state != DraftState::OutlinePending {
            return Err(self.illegal("receive an outline"));
        }
        self.outline = Some(outline);
        self.outline_approved = false;
        self.set_state(DraftState::OutlineReady);
        Ok(())
    }

    pub fn approve_outline(&mut self) -> WorkflowResult<()> {
        if self.state != DraftState::OutlineReady || self.outline.is_none() {
            return Err(self.illegal("approve the outline"));
        }
        self.outline_approved = true;
        self.touch();
        Ok(())
    }

    /// Enter `content_pending`. Requires an approved outline; ready content
    /// may be regenerated until it is approved.
    pub fn begin_content(&mut self) -> WorkflowResult<()> {
        match self.state {
            DraftState::OutlineReady if self.outline_approved => {}
            DraftState::ContentReady => {}
            DraftState::OutlineReady => {
                return Err(WorkflowError::illegal(format!(
                    "asset draft {} needs an approved outline before content can be generated",
                    self.id
                )))
            }
            _ => return Err(self.illegal("request content")),
        }
        self.set_state(DraftState::ContentPending);
        Ok(())
    }

    pub fn receive_content(&mut self, content: String) -> WorkflowResult<()> {
        if self.state != DraftState::ContentPending {
            return Err(self.illegal("receive content"));
        }
        self.content = Some(content);
        self.set_state(DraftState::ContentReady);
        Ok(())
    }

    pub fn approve_content(&mut self) -> WorkflowResult<()> {
        if self.state != DraftState::ContentReady {
            return Err(self.illegal("approve the content"));
        }
        self.set_state(DraftState::Approved);
        Ok(())
    }

    /// Discard the output waiting at the current gate
    pub fn reject(&mut self) -> WorkflowResult<()> {
        match self.state {
            DraftState::OutlineReady => {
                self.outline = None;
                self.outline_approved = false;
                self.set_state(DraftState::None);
            }
            DraftState::ContentReady => {
                self.content = None;
                self.set_state(DraftState::OutlineReady);
            }
            _ => return Err(self.illegal("reject")),
        }
        Ok(())
    }

    pub fn publish(&mut self) -> WorkflowResult<()> {
        if self.state != DraftState::Approved {
            return Err(self.illegal("publish"));
        }
        self.set_state(DraftState::Published);
        Ok(())
    }

    fn set_state(&mut self, state: DraftState) {
        self.state = state;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn illegal(&self, action: &str) -> WorkflowError {
        WorkflowError::illegal(format!(
            "cannot {} for asset draft {} in state {}",
            action, self.id, self.state
        ))
    }
}
