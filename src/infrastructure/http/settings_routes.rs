use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use crate::application::ports::outbound::SettingsError;
use crate::domain::value_objects::WorkflowSettings;
use crate::infrastructure::state::AppState;

pub fn settings_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/settings", get(get_settings))
        .route("/api/settings", put(update_settings))
        .route("/api/settings/reset", post(reset_settings))
}

fn settings_error(e: SettingsError) -> (StatusCode, String) {
    let status = match e {
        SettingsError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SettingsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<WorkflowSettings> {
    Json(state.settings_service.get().await)
}

/// Applies to sessions opened after the update
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<WorkflowSettings>,
) -> Result<Json<WorkflowSettings>, (StatusCode, String)> {
    state
        .settings_service
        .update(settings.clone())
        .await
        .map_err(settings_error)?;
    Ok(Json(settings))
}

async fn reset_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkflowSettings>, (StatusCode, String)> {
    state
        .settings_service
        .reset()
        .await
        .map(Json)
        .map_err(settings_error)
}
