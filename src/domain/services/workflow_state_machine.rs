//! Workflow state machine - Step gating for a journey circle session
//!
//! The machine owns the circle aggregate for the length of an editing
//! session. Every command returns a `WorkflowResult`; a failed command leaves
//! the machine exactly as it was.
//!
//! Navigation rules:
//! - `advance` runs the current step's validator and moves forward only if it
//!   passes; advancing past the last step completes the circle
//! - `retreat` always moves back one step and keeps all entered data
//! - `jump_to` may only target steps that have been validated before
//!
//! Content generation is split in two halves so the caller can await the
//! generator without holding the session: `begin_generation` enters the
//! pending sub-state and hands out a ticket, `complete_generation` applies the
//! result only if that ticket is still pending. `cancel_generation` and
//! `abort_generation` restore the state from before the request.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::{
    ChildRecord, ChildRef, JourneyCircleAggregate, StepField, StepValue, WorkflowCheckpoint,
};
use crate::domain::entities::{AssetDraft, AssetTarget, JourneyCircle, SuggestionScope};
use crate::domain::errors::{WorkflowError, WorkflowResult};
use crate::domain::services::step_validators::{validate_step, StepValidation};
use crate::domain::value_objects::{
    AssetDraftId, GeneratedDraft, GenerationContext, GenerationRequest, GenerationTicket,
    ProblemId, SourceMaterial, WizardStep, WorkflowPosition, WorkflowSettings,
};

/// User decision at an asset draft's approval gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftDecision {
    ApproveOutline,
    ApproveContent,
    Reject,
    Publish,
}

/// A generation that has been started and not yet resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingGeneration {
    pub ticket: GenerationTicket,
    pub request: GenerationRequest,
    pub started_at: DateTime<Utc>,
    /// Draft as it was before the request, restored on cancel or failure
    #[serde(skip)]
    restore: Option<AssetDraft>,
}

impl PendingGeneration {
    /// Name of the pending sub-state, e.g. `outline_pending`
    pub fn sub_state(&self) -> &'static str {
        match self.request {
            GenerationRequest::ProblemTitles => "problem_titles_pending",
            GenerationRequest::SolutionTitles { .. } => "solution_titles_pending",
            GenerationRequest::AssetOutline { .. } => "outline_pending",
            GenerationRequest::AssetContent { .. } => "content_pending",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowStateMachine {
    settings: WorkflowSettings,
    circle: JourneyCircleAggregate,
    /// Bumped on every mutation of the circle
    revision: u64,
    validation_cache: Option<(u64, StepValidation)>,
    pending: Option<PendingGeneration>,
    next_ticket: u64,
}

impl WorkflowStateMachine {
    pub fn new(settings: WorkflowSettings, circle: JourneyCircleAggregate) -> Self {
        Self {
            settings,
            circle,
            revision: 0,
            validation_cache: None,
            pending: None,
            next_ticket: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn circle(&self) -> &JourneyCircleAggregate {
        &self.circle
    }

    pub fn position(&self) -> WorkflowPosition {
        self.circle.checkpoint().position
    }

    pub fn highest_validated(&self) -> Option<WizardStep> {
        self.circle.checkpoint().highest_validated
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pending(&self) -> Option<&PendingGeneration> {
        self.pending.as_ref()
    }

    pub fn get(&self, field: StepField) -> StepValue {
        self.circle.get(field)
    }

    /// Validate any step against the current data
    pub fn validate(&self, step: WizardStep) -> StepValidation {
        validate_step(step, &self.circle, &self.settings)
    }

    /// Validation of the current step, re-run only after the data changed
    pub fn validate_current(&mut self) -> StepValidation {
        let step = self.position().step().unwrap_or(WizardStep::LAST);
        if let Some((revision, cached)) = &self.validation_cache {
            if *revision == self.revision && cached.step == step {
                return cached.clone();
            }
        }
        let validation = self.validate(step);
        self.validation_cache = Some((self.revision, validation.clone()));
        validation
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn advance(&mut self) -> WorkflowResult<WorkflowPosition> {
        self.ensure_idle("advance")?;
        let step = self
            .position()
            .step()
            .ok_or_else(|| WorkflowError::illegal("the journey circle is already complete"))?;

        self.validate_current().into_result()?;

        if step == WizardStep::ServiceArea && self.circle.circle().is_none() {
            return Err(WorkflowError::illegal(
                "the journey circle must be created before leaving the service area step",
            ));
        }

        let position = match step.next() {
            Some(next) => WorkflowPosition::Step(next),
            None => WorkflowPosition::Complete,
        };
        let highest = self.highest_validated().map_or(step, |h| h.max(step));
        self.circle.set_checkpoint(WorkflowCheckpoint {
            position,
            highest_validated: Some(highest),
        });
        tracing::debug!(from = %step, to = %position, "Advanced wizard");
        Ok(position)
    }

    pub fn retreat(&mut self) -> WorkflowResult<WorkflowPosition> {
        self.ensure_idle("retreat")?;
        let position = match self.position() {
            WorkflowPosition::Complete => WorkflowPosition::Step(WizardStep::LAST),
            WorkflowPosition::Step(step) => match step.previous() {
                Some(previous) => WorkflowPosition::Step(previous),
                None => return Err(WorkflowError::illegal("already at the first step")),
            },
        };
        self.move_to(position);
        Ok(position)
    }

    pub fn jump_to(&mut self, target: WizardStep) -> WorkflowResult<WorkflowPosition> {
        self.ensure_idle("jump")?;
        let reachable = target == WizardStep::FIRST
            || self.position().step() == Some(target)
            || self.highest_validated().is_some_and(|h| target <= h);
        if !reachable {
            return Err(WorkflowError::illegal(format!(
                "{} has not been reached yet",
                target
            )));
        }
        let position = WorkflowPosition::Step(target);
        self.move_to(position);
        Ok(position)
    }

    fn move_to(&mut self, position: WorkflowPosition) {
        let checkpoint = WorkflowCheckpoint {
            position,
            ..self.circle.checkpoint()
        };
        self.circle.set_checkpoint(checkpoint);
        tracing::debug!(to = %position, "Moved wizard");
    }

    // ========================================================================
    // Step data
    // ========================================================================

    pub fn set_step_data(&mut self, value: StepValue) -> WorkflowResult<()> {
        self.circle.set(value)?;
        self.touch();
        Ok(())
    }

    pub fn append_child(&mut self, record: ChildRecord) -> WorkflowResult<ChildRef> {
        let created = self.circle.append_child(record)?;
        self.touch();
        Ok(created)
    }

    pub fn remove_child(&mut self, child: ChildRef) -> WorkflowResult<Vec<ChildRef>> {
        self.ensure_idle("remove data")?;
        let removed = self.circle.remove_child(child)?;
        self.touch();
        Ok(removed)
    }

    pub fn move_problem(&mut self, problem_id: ProblemId, position: usize) -> WorkflowResult<()> {
        self.circle.move_problem(problem_id, position)?;
        self.touch();
        Ok(())
    }

    pub fn confirm_suggestion(&mut self, scope: SuggestionScope, index: usize) -> WorkflowResult<ChildRef> {
        let created = self.circle.confirm_suggestion(scope, index)?;
        self.touch();
        Ok(created)
    }

    pub fn review_draft(&mut self, draft_id: AssetDraftId, decision: DraftDecision) -> WorkflowResult<()> {
        let draft = self.circle.draft_mut(draft_id)?;
        match decision {
            DraftDecision::ApproveOutline => draft.approve_outline()?,
            DraftDecision::ApproveContent => draft.approve_content()?,
            DraftDecision::Reject => draft.reject()?,
            DraftDecision::Publish => draft.publish()?,
        }
        self.touch();
        Ok(())
    }

    /// Bind the record created by the persistence side at step 2
    pub fn attach_circle(&mut self, circle: JourneyCircle) -> WorkflowResult<()> {
        self.circle.attach_circle(circle)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.validation_cache = None;
    }

    fn ensure_idle(&self, action: &str) -> WorkflowResult<()> {
        match &self.pending {
            Some(pending) => Err(WorkflowError::illegal(format!(
                "cannot {} while generation {} is {}",
                action,
                pending.ticket,
                pending.sub_state()
            ))),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Content generation
    // ========================================================================

    /// Enter the pending sub-state for `request`
    pub fn begin_generation(
        &mut self,
        request: GenerationRequest,
    ) -> WorkflowResult<(GenerationTicket, GenerationContext)> {
        self.ensure_idle("start another generation")?;

        let mut context = self.base_context();
        let restore = match request {
            GenerationRequest::ProblemTitles => {
                context.confirmed_titles = self.confirmed_titles(SuggestionScope::ProblemTitles);
                None
            }
            GenerationRequest::SolutionTitles { problem_id } => {
                let problem = self
                    .circle
                    .problems()
                    .into_iter()
                    .find(|p| p.id == problem_id)
                    .map(|p| p.title.clone())
                    .ok_or_else(|| {
                        WorkflowError::integrity(format!("no problem with id {}", problem_id))
                    })?;
                context.focus = Some(problem);
                context.confirmed_titles =
                    self.confirmed_titles(SuggestionScope::SolutionTitles(problem_id));
                None
            }
            GenerationRequest::AssetOutline { draft_id } | GenerationRequest::AssetContent { draft_id } => {
                let before = self
                    .circle
                    .draft(draft_id)
                    .cloned()
                    .ok_or_else(|| {
                        WorkflowError::integrity(format!("no asset draft with id {}", draft_id))
                    })?;
                context.focus = self.target_title(before.target);
                context.asset_title = Some(before.title.clone());
                context.outline = before.outline.clone();

                let draft = self.circle.draft_mut(draft_id)?;
                if matches!(request, GenerationRequest::AssetOutline { .. }) {
                    draft.begin_outline()?;
                } else {
                    draft.begin_content()?;
                }
                Some(before)
            }
        };

        self.next_ticket += 1;
        let ticket = GenerationTicket::new(self.next_ticket);
        self.pending = Some(PendingGeneration {
            ticket,
            request,
            started_at: Utc::now(),
            restore,
        });
        self.touch();
        tracing::debug!(%ticket, kind = %request.kind(), "Generation pending");
        Ok((ticket, context))
    }

    /// Apply a generator result if `ticket` is still the pending generation
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: GeneratedDraft,
    ) -> WorkflowResult<()> {
        let pending = self.take_pending(ticket)?;
        let kind = pending.request.kind();

        let applied = match (pending.request, result) {
            (GenerationRequest::ProblemTitles, GeneratedDraft::Titles(titles)) => self
                .circle
                .replace_suggestions(SuggestionScope::ProblemTitles, titles, self.settings.max_suggestions),
            (GenerationRequest::SolutionTitles { problem_id }, GeneratedDraft::Titles(titles)) => {
                self.circle.replace_suggestions(
                    SuggestionScope::SolutionTitles(problem_id),
                    titles,
                    self.settings.max_suggestions,
                )
            }
            (GenerationRequest::AssetOutline { draft_id }, GeneratedDraft::Outline(outline)) => self
                .circle
                .draft_mut(draft_id)
                .and_then(|d| d.receive_outline(outline)),
            (GenerationRequest::AssetContent { draft_id }, GeneratedDraft::Content(content)) => self
                .circle
                .draft_mut(draft_id)
                .and_then(|d| d.receive_content(content)),
            _ => Err(WorkflowError::ExternalService(format!(
                "generator returned the wrong kind of draft for {}",
                kind
            ))),
        };

        if let Err(e) = applied {
            self.restore(pending);
            return Err(e);
        }
        self.touch();
        Ok(())
    }

    /// Resolve a failed or timed-out generation
    pub fn abort_generation(&mut self, ticket: GenerationTicket) -> WorkflowResult<()> {
        let pending = self.take_pending(ticket)?;
        self.restore(pending);
        Ok(())
    }

    /// Drop the pending generation; a late result for it will be discarded
    pub fn cancel_generation(&mut self) -> WorkflowResult<GenerationTicket> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| WorkflowError::illegal("no generation is pending"))?;
        let ticket = pending.ticket;
        self.restore(pending);
        tracing::debug!(%ticket, "Generation cancelled");
        Ok(ticket)
    }

    fn take_pending(&mut self, ticket: GenerationTicket) -> WorkflowResult<PendingGeneration> {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                return Err(WorkflowError::illegal(format!(
                    "generation {} is no longer pending",
                    ticket
                )))
            }
        }
        self.pending
            .take()
            .ok_or_else(|| WorkflowError::illegal("no generation is pending"))
    }

    fn restore(&mut self, pending: PendingGeneration) {
        if let Some(draft) = pending.restore {
            self.circle.restore_draft(draft);
        }
        self.touch();
    }

    fn base_context(&self) -> GenerationContext {
        GenerationContext {
            service_area_id: self.circle.service_area_id(),
            industries: self.circle.industries().iter().map(|i| i.get()).collect(),
            brain_content: self
                .circle
                .brain_content()
                .iter()
                .map(|b| SourceMaterial {
                    kind: b.kind.to_string(),
                    title: b.title.clone(),
                    value: b.value.clone(),
                })
                .collect(),
            problems: self
                .circle
                .problems()
                .iter()
                .map(|p| p.title.clone())
                .collect(),
            max_titles: self.settings.max_suggestions,
            ..GenerationContext::default()
        }
    }

    fn confirmed_titles(&self, scope: SuggestionScope) -> Vec<String> {
        self.circle
            .suggestions(scope)
            .iter()
            .filter(|s| s.confirmed)
            .map(|s| s.title.clone())
            .collect()
    }

    fn target_title(&self, target: AssetTarget) -> Option<String> {
        match target {
            AssetTarget::Problem(id) => self
                .circle
                .problems()
                .into_iter()
                .find(|p| p.id == id)
                .map(|p| p.title.clone()),
            AssetTarget::Solution(id) => self
                .circle
                .solutions()
                .find(|s| s.id == id)
                .map(|s| s.title.clone()),
        }
    }
}
