//! Generation Service - Runs content generation for wizard sessions
//!
//! A generation takes two short critical sections on the session: one to
//! enter the pending sub-state, and one to apply or discard the result once
//! the generator call has ended. The generator itself is awaited with the
//! session unlocked, so the UI can keep reading the view model and can cancel.
//!
//! The call and its resolution run on a spawned task. If the caller goes away
//! the generation is cancelled and the session restored, instead of staying
//! pending with nobody to resolve it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn, Instrument};

use crate::application::dto::WizardViewModel;
use crate::application::ports::outbound::{ContentGenerationPort, GenerationError};
use crate::application::services::wizard_service::{SessionHandle, WizardError, WizardService};
use crate::domain::errors::WorkflowError;
use crate::domain::value_objects::{
    GeneratedDraft, GenerationContext, GenerationRequest, GenerationTicket, SessionId,
};

type RunningGenerations = Arc<RwLock<HashMap<SessionId, (GenerationTicket, CancellationToken)>>>;

enum Outcome {
    Generated(GeneratedDraft),
    Failed(GenerationError),
    TimedOut,
    Cancelled,
}

/// One started generation, handed to the task that resolves it
struct GenerationRun {
    session_id: SessionId,
    handle: SessionHandle,
    request: GenerationRequest,
    ticket: GenerationTicket,
    context: GenerationContext,
    timeout: Duration,
    cancel: CancellationToken,
}

pub struct GenerationService {
    wizard: Arc<WizardService>,
    generator: Arc<dyn ContentGenerationPort>,
    running: RunningGenerations,
}

impl GenerationService {
    pub fn new(wizard: Arc<WizardService>, generator: Arc<dyn ContentGenerationPort>) -> Self {
        Self {
            wizard,
            generator,
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Run one generation to completion and return the updated view
    #[instrument(skip(self), fields(kind = %request.kind()))]
    pub async fn generate(
        &self,
        session_id: SessionId,
        request: GenerationRequest,
    ) -> Result<WizardViewModel, WizardError> {
        let handle = self.wizard.session(session_id).await?;

        // Registered under the session lock so a cancel always finds the token
        let run = {
            let mut machine = handle.lock().await;
            let (ticket, context) = machine.begin_generation(request)?;
            let cancel = CancellationToken::new();
            self.running
                .write()
                .await
                .insert(session_id, (ticket, cancel.clone()));
            GenerationRun {
                session_id,
                handle: handle.clone(),
                request,
                ticket,
                context,
                timeout: machine.settings().generation_timeout(),
                cancel,
            }
        };
        info!(%session_id, ticket = %run.ticket, "Generation started");

        let abandoned = run.cancel.clone().drop_guard();
        let task = tokio::spawn(
            resolve(self.generator.clone(), self.running.clone(), run).in_current_span(),
        );
        let result = task.await;
        abandoned.disarm();

        result.map_err(|e| {
            WorkflowError::ExternalService(format!("generation task failed: {}", e))
        })?
    }

    /// Cancel the pending generation of a session and restore its state
    #[instrument(skip(self))]
    pub async fn cancel(&self, session_id: SessionId) -> Result<WizardViewModel, WizardError> {
        let handle = self.wizard.session(session_id).await?;
        let mut machine = handle.lock().await;
        let ticket = machine.cancel_generation()?;

        let mut running = self.running.write().await;
        if let Some((running_ticket, token)) = running.remove(&session_id) {
            if running_ticket == ticket {
                token.cancel();
            } else {
                running.insert(session_id, (running_ticket, token));
            }
        }
        info!(%session_id, %ticket, "Generation cancelled");
        Ok(WizardViewModel::build(session_id, &mut machine))
    }
}

/// Await the generator and apply or discard its outcome
async fn resolve(
    generator: Arc<dyn ContentGenerationPort>,
    running: RunningGenerations,
    run: GenerationRun,
) -> Result<WizardViewModel, WizardError> {
    let GenerationRun {
        session_id,
        handle,
        request,
        ticket,
        context,
        timeout,
        cancel,
    } = run;

    let outcome = tokio::select! {
        _ = cancel.cancelled() => Outcome::Cancelled,
        result = tokio::time::timeout(timeout, generator.generate(request.kind(), &context)) => {
            match result {
                Ok(Ok(draft)) => Outcome::Generated(draft),
                Ok(Err(e)) => Outcome::Failed(e),
                Err(_) => Outcome::TimedOut,
            }
        }
    };

    {
        let mut running = running.write().await;
        if running.get(&session_id).is_some_and(|(t, _)| *t == ticket) {
            running.remove(&session_id);
        }
    }

    let mut machine = handle.lock().await;
    match outcome {
        Outcome::Generated(draft) => {
            machine.complete_generation(ticket, draft)?;
            info!(%session_id, %ticket, "Generation applied");
        }
        Outcome::Failed(e) => {
            warn!(%session_id, %ticket, error = %e, "Generation failed");
            machine.abort_generation(ticket)?;
            return Err(WorkflowError::from(e).into());
        }
        Outcome::TimedOut => {
            warn!(%session_id, %ticket, timeout_secs = timeout.as_secs(), "Generation timed out");
            machine.abort_generation(ticket)?;
            return Err(WorkflowError::ExternalService(format!(
                "generation timed out after {}s",
                timeout.as_secs()
            ))
            .into());
        }
        Outcome::Cancelled => {
            // Still pending means the caller went away rather than cancelling
            if machine.pending().is_some_and(|p| p.ticket == ticket) {
                warn!(%session_id, %ticket, "Generation abandoned by caller");
                machine.abort_generation(ticket)?;
            }
            return Err(WorkflowError::illegal(format!(
                "generation {} was cancelled",
                ticket
            ))
            .into());
        }
    }
    Ok(WizardViewModel::build(session_id, &mut machine))
}
