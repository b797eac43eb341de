//! Wizard Service - Session registry and command routing
//!
//! Each open session owns one `WorkflowStateMachine` behind an async mutex, so
//! commands for a session are applied one at a time. Navigation commands run
//! on a copy of the machine; the copy replaces the live machine only after the
//! circle has been saved, so a failed save leaves the session untouched.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::application::dto::{OpenSessionRequestDto, WizardViewModel};
use crate::application::ports::outbound::{JourneyCircleRepositoryPort, RepositoryError};
use crate::application::services::SettingsService;
use crate::domain::aggregates::{ChildRecord, ChildRef, JourneyCircleAggregate, StepValue};
use crate::domain::entities::SuggestionScope;
use crate::domain::errors::{WorkflowError, WorkflowResult};
use crate::domain::services::{DraftDecision, WorkflowStateMachine};
use crate::domain::value_objects::{
    AssetDraftId, ProblemId, SessionId, WizardStep, WorkflowPosition,
};

pub type SessionHandle = Arc<Mutex<WorkflowStateMachine>>;

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl From<RepositoryError> for WizardError {
    fn from(err: RepositoryError) -> Self {
        WizardError::Workflow(err.into())
    }
}

pub struct WizardService {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    repository: Arc<dyn JourneyCircleRepositoryPort>,
    settings: Arc<SettingsService>,
}

impl WizardService {
    pub fn new(
        repository: Arc<dyn JourneyCircleRepositoryPort>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            repository,
            settings,
        }
    }

    /// Open a session, resuming the stored circle of the service area if any
    #[instrument(skip(self, request), fields(client_id = %request.client_id))]
    pub async fn open_session(
        &self,
        request: OpenSessionRequestDto,
    ) -> Result<WizardViewModel, WizardError> {
        let settings = self.settings.get().await;

        let aggregate = match request.service_area_id {
            Some(service_area_id) => match self.repository.load(service_area_id).await? {
                Some(stored) => {
                    if stored.client_id() != request.client_id {
                        return Err(WorkflowError::integrity(format!(
                            "service area {} belongs to another client",
                            service_area_id
                        ))
                        .into());
                    }
                    info!(%service_area_id, "Resuming stored journey circle");
                    stored.hydrated(settings.max_problems)
                }
                None => {
                    let mut fresh =
                        JourneyCircleAggregate::new(request.client_id, settings.max_problems);
                    fresh.set(StepValue::ServiceArea(Some(service_area_id)))?;
                    fresh
                }
            },
            None => JourneyCircleAggregate::new(request.client_id, settings.max_problems),
        };

        let session_id = SessionId::new();
        let mut machine = WorkflowStateMachine::new(settings, aggregate);
        let view = WizardViewModel::build(session_id, &mut machine);
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::new(Mutex::new(machine)));
        info!(%session_id, "Opened wizard session");
        Ok(view)
    }

    pub async fn close_session(&self, session_id: SessionId) -> Result<(), WizardError> {
        match self.sessions.write().await.remove(&session_id) {
            Some(_) => {
                info!(%session_id, "Closed wizard session");
                Ok(())
            }
            None => Err(WizardError::SessionNotFound(session_id)),
        }
    }

    pub async fn session(&self, session_id: SessionId) -> Result<SessionHandle, WizardError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(WizardError::SessionNotFound(session_id))
    }

    pub async fn view(&self, session_id: SessionId) -> Result<WizardViewModel, WizardError> {
        let handle = self.session(session_id).await?;
        let mut machine = handle.lock().await;
        Ok(WizardViewModel::build(session_id, &mut machine))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Advance one step; leaving step 2 creates the circle record first
    #[instrument(skip(self))]
    pub async fn advance(&self, session_id: SessionId) -> Result<WizardViewModel, WizardError> {
        let handle = self.session(session_id).await?;
        let mut machine = handle.lock().await;

        // Bound to the live machine before the save; a retry must not create it twice
        let creating = machine.position() == WorkflowPosition::Step(WizardStep::ServiceArea)
            && machine.circle().circle().is_none()
            && machine.pending().is_none();
        if creating {
            machine.validate(WizardStep::ServiceArea).into_result()?;
            if let Some(service_area_id) = machine.circle().service_area_id() {
                let circle = self
                    .repository
                    .create(machine.circle().client_id(), service_area_id)
                    .await?;
                info!(circle_id = %circle.id, %service_area_id, "Created journey circle");
                machine.attach_circle(circle)?;
            }
        }

        let mut next = machine.clone();
        let position = next.advance()?;
        self.persist(&next).await?;
        *machine = next;
        debug!(%session_id, %position, "Session advanced");
        Ok(WizardViewModel::build(session_id, &mut machine))
    }

    #[instrument(skip(self))]
    pub async fn retreat(&self, session_id: SessionId) -> Result<WizardViewModel, WizardError> {
        self.navigate(session_id, |m| m.retreat()).await
    }

    #[instrument(skip(self))]
    pub async fn jump_to(
        &self,
        session_id: SessionId,
        step: WizardStep,
    ) -> Result<WizardViewModel, WizardError> {
        self.navigate(session_id, |m| m.jump_to(step)).await
    }

    async fn navigate<F>(&self, session_id: SessionId, step: F) -> Result<WizardViewModel, WizardError>
    where
        F: FnOnce(&mut WorkflowStateMachine) -> WorkflowResult<WorkflowPosition>,
    {
        let handle = self.session(session_id).await?;
        let mut machine = handle.lock().await;
        let mut next = machine.clone();
        let position = step(&mut next)?;
        self.persist(&next).await?;
        *machine = next;
        debug!(%session_id, %position, "Session moved");
        Ok(WizardViewModel::build(session_id, &mut machine))
    }

    async fn persist(&self, machine: &WorkflowStateMachine) -> Result<(), WizardError> {
        if machine.circle().circle().is_some() {
            self.repository.save(machine.circle()).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Step data
    // ========================================================================

    pub async fn set_step_data(
        &self,
        session_id: SessionId,
        value: StepValue,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| m.set_step_data(value)).await
    }

    pub async fn append_child(
        &self,
        session_id: SessionId,
        record: ChildRecord,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| m.append_child(record).map(|_| ()))
            .await
    }

    pub async fn remove_child(
        &self,
        session_id: SessionId,
        child: ChildRef,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| {
            let removed = m.remove_child(child)?;
            debug!(?child, cascaded = removed.len().saturating_sub(1), "Removed child");
            Ok(())
        })
        .await
    }

    pub async fn move_problem(
        &self,
        session_id: SessionId,
        problem_id: ProblemId,
        position: usize,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| m.move_problem(problem_id, position))
            .await
    }

    pub async fn confirm_suggestion(
        &self,
        session_id: SessionId,
        scope: SuggestionScope,
        index: usize,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| m.confirm_suggestion(scope, index).map(|_| ()))
            .await
    }

    #[instrument(skip(self))]
    pub async fn review_draft(
        &self,
        session_id: SessionId,
        draft_id: AssetDraftId,
        decision: DraftDecision,
    ) -> Result<WizardViewModel, WizardError> {
        self.mutate(session_id, |m| m.review_draft(draft_id, decision))
            .await
    }

    async fn mutate<F>(&self, session_id: SessionId, change: F) -> Result<WizardViewModel, WizardError>
    where
        F: FnOnce(&mut WorkflowStateMachine) -> WorkflowResult<()>,
    {
        let handle = self.session(session_id).await?;
        let mut machine = handle.lock().await;
        change(&mut *machine)?;
        Ok(WizardViewModel::build(session_id, &mut machine))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::ports::outbound::{SettingsError, SettingsRepositoryPort};
    use crate::domain::aggregates::StepField;
    use crate::domain::entities::{CircleStatus, JourneyCircle};
    use crate::domain::value_objects::{
        ClientId, IndustryId, JourneyCircleId, ServiceAreaId, WorkflowSettings,
    };
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    /// Circle store keyed by service area, with a switch to fail saves
    #[derive(Default)]
    pub(crate) struct MockCircleRepository {
        circles: std::sync::Mutex<HashMap<ServiceAreaId, JourneyCircleAggregate>>,
        next_id: AtomicI64,
        pub(crate) fail_saves: AtomicBool,
    }

    #[async_trait::async_trait]
    impl JourneyCircleRepositoryPort for MockCircleRepository {
        async fn create(
            &self,
            client_id: ClientId,
            service_area_id: ServiceAreaId,
        ) -> Result<JourneyCircle, RepositoryError> {
            let mut circles = self.circles.lock().unwrap();
            if circles.contains_key(&service_area_id) {
                return Err(RepositoryError::Duplicate(service_area_id));
            }
            let id = JourneyCircleId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let circle = JourneyCircle::new(id, client_id, service_area_id);
            let mut aggregate = JourneyCircleAggregate::new(client_id, 5);
            aggregate
                .set(StepValue::ServiceArea(Some(service_area_id)))
                .unwrap();
            aggregate.attach_circle(circle.clone()).unwrap();
            circles.insert(service_area_id, aggregate);
            Ok(circle)
        }

        async fn load(
            &self,
            service_area_id: ServiceAreaId,
        ) -> Result<Option<JourneyCircleAggregate>, RepositoryError> {
            Ok(self.circles.lock().unwrap().get(&service_area_id).cloned())
        }

        async fn save(&self, aggregate: &JourneyCircleAggregate) -> Result<(), RepositoryError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(RepositoryError::Database("disk full".to_string()));
            }
            let circle = aggregate.circle().ok_or(RepositoryError::NotCreated)?;
            self.circles
                .lock()
                .unwrap()
                .insert(circle.service_area_id, aggregate.clone());
            Ok(())
        }
    }

    struct FixedSettings(WorkflowSettings);

    #[async_trait::async_trait]
    impl SettingsRepositoryPort for FixedSettings {
        async fn get(&self) -> Result<WorkflowSettings, SettingsError> {
            Ok(self.0.clone())
        }
        async fn save(&self, _settings: &WorkflowSettings) -> Result<(), SettingsError> {
            Ok(())
        }
        async fn reset(&self) -> Result<WorkflowSettings, SettingsError> {
            Ok(WorkflowSettings::default())
        }
    }

    pub(crate) fn service(repository: Arc<MockCircleRepository>) -> WizardService {
        service_with(repository, WorkflowSettings::default())
    }

    pub(crate) fn service_with(
        repository: Arc<MockCircleRepository>,
        settings: WorkflowSettings,
    ) -> WizardService {
        WizardService::new(
            repository,
            Arc::new(SettingsService::new(Arc::new(FixedSettings(settings)))),
        )
    }

    fn open(client: i64, service_area: Option<i64>) -> OpenSessionRequestDto {
        OpenSessionRequestDto {
            client_id: ClientId::new(client),
            service_area_id: service_area.map(ServiceAreaId::new),
        }
    }

    /// Open a session for service area 7 and walk it to step 4
    pub(crate) async fn session_at_industries(wizard: &WizardService) -> SessionId {
        let view = wizard.open_session(open(1, Some(7))).await.unwrap();
        let id = view.session_id;
        wizard.advance(id).await.unwrap();
        wizard.advance(id).await.unwrap();
        wizard.advance(id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_leaving_service_area_creates_and_saves_circle() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let id = session_at_industries(&wizard).await;

        let view = wizard.view(id).await.unwrap();
        assert_eq!(view.position, WorkflowPosition::Step(WizardStep::Industries));
        assert!(view.circle_id.is_some());

        let stored = repository
            .load(ServiceAreaId::new(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.checkpoint().position,
            WorkflowPosition::Step(WizardStep::Industries)
        );
    }

    #[tokio::test]
    async fn test_second_circle_for_service_area_is_rejected() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        session_at_industries(&wizard).await;

        let other = wizard.open_session(open(1, None)).await.unwrap().session_id;
        wizard.advance(other).await.unwrap();
        wizard
            .set_step_data(other, StepValue::ServiceArea(Some(ServiceAreaId::new(7))))
            .await
            .unwrap();
        let err = wizard.advance(other).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Workflow(WorkflowError::IntegrityViolation(_))
        ));
        let view = wizard.view(other).await.unwrap();
        assert_eq!(view.position, WorkflowPosition::Step(WizardStep::ServiceArea));
        assert!(view.circle_id.is_none());
    }

    #[tokio::test]
    async fn test_reopening_resumes_stored_circle() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let first = session_at_industries(&wizard).await;
        wizard
            .set_step_data(
                first,
                StepValue::Industries([IndustryId::new(2)].into_iter().collect()),
            )
            .await
            .unwrap();
        wizard.advance(first).await.unwrap();

        let resumed = wizard.open_session(open(1, Some(7))).await.unwrap();
        assert_ne!(resumed.session_id, first);
        assert_eq!(
            resumed.position,
            WorkflowPosition::Step(WizardStep::PrimaryProblem)
        );
        assert_eq!(resumed.highest_validated, Some(WizardStep::Industries));

        let err = wizard.open_session(open(2, Some(7))).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Workflow(WorkflowError::IntegrityViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_session_in_place() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let id = session_at_industries(&wizard).await;

        repository.fail_saves.store(true, Ordering::SeqCst);
        let err = wizard.retreat(id).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Workflow(WorkflowError::ExternalService(_))
        ));
        assert_eq!(
            wizard.view(id).await.unwrap().position,
            WorkflowPosition::Step(WizardStep::Industries)
        );
    }

    #[tokio::test]
    async fn test_advance_after_failed_save_keeps_created_circle() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let id = wizard.open_session(open(1, Some(7))).await.unwrap().session_id;
        wizard.advance(id).await.unwrap();

        repository.fail_saves.store(true, Ordering::SeqCst);
        let err = wizard.advance(id).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Workflow(WorkflowError::ExternalService(_))
        ));
        let view = wizard.view(id).await.unwrap();
        assert_eq!(view.position, WorkflowPosition::Step(WizardStep::ServiceArea));
        let circle_id = view.circle_id;
        assert!(circle_id.is_some());

        repository.fail_saves.store(false, Ordering::SeqCst);
        let view = wizard.advance(id).await.unwrap();
        assert_eq!(
            view.position,
            WorkflowPosition::Step(WizardStep::ExistingAssets)
        );
        assert_eq!(view.circle_id, circle_id);
        let stored = repository
            .load(ServiceAreaId::new(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.circle().map(|c| c.id), circle_id);
    }

    #[tokio::test]
    async fn test_circle_over_lowered_limit_still_opens() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let id = session_at_industries(&wizard).await;
        for title in ["A", "B", "C"] {
            wizard
                .append_child(
                    id,
                    ChildRecord::Problem {
                        title: title.to_string(),
                        description: String::new(),
                    },
                )
                .await
                .unwrap();
        }
        wizard.retreat(id).await.unwrap();

        let lowered = service_with(
            repository.clone(),
            WorkflowSettings {
                max_problems: 2,
                ..WorkflowSettings::default()
            },
        );
        let view = lowered.open_session(open(1, Some(7))).await.unwrap();
        assert_eq!(view.data.problem_count(), 3);

        let handle = lowered.session(view.session_id).await.unwrap();
        let validation = handle.lock().await.validate(WizardStep::ProblemTitles);
        assert!(validation
            .violations
            .iter()
            .any(|v| v.rule == "problem_count"));
    }

    #[tokio::test]
    async fn test_view_reports_status_and_validation() {
        let repository = Arc::new(MockCircleRepository::default());
        let wizard = service(repository.clone());
        let id = session_at_industries(&wizard).await;
        let view = wizard.view(id).await.unwrap();
        assert_eq!(view.status, CircleStatus::Incomplete);
        assert!(!view.validation.passed());
    }

    #[tokio::test]
    async fn test_unknown_session_and_close() {
        let wizard = service(Arc::new(MockCircleRepository::default()));
        let missing = SessionId::new();
        assert!(matches!(
            wizard.view(missing).await,
            Err(WizardError::SessionNotFound(_))
        ));

        let id = wizard.open_session(open(1, None)).await.unwrap().session_id;
        wizard.close_session(id).await.unwrap();
        assert!(matches!(
            wizard.advance(id).await,
            Err(WizardError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_step_data_round_trip() {
        let wizard = service(Arc::new(MockCircleRepository::default()));
        let id = wizard.open_session(open(1, None)).await.unwrap().session_id;
        let view = wizard
            .set_step_data(id, StepValue::PublishNotes("launch in May".to_string()))
            .await
            .unwrap();
        assert_eq!(
            view.data.get(StepField::PublishNotes),
            StepValue::PublishNotes("launch in May".to_string())
        );
    }
}
