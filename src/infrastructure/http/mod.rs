//! HTTP REST API routes

mod session_routes;
mod settings_routes;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

pub use settings_routes::*;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(session_routes::open_session))
        .route("/api/sessions/{id}", get(session_routes::get_session))
        .route("/api/sessions/{id}", delete(session_routes::close_session))
        // Navigation
        .route("/api/sessions/{id}/advance", post(session_routes::advance))
        .route("/api/sessions/{id}/retreat", post(session_routes::retreat))
        .route("/api/sessions/{id}/jump", post(session_routes::jump))
        // Step data
        .route("/api/sessions/{id}/data", put(session_routes::set_step_data))
        .route(
            "/api/sessions/{id}/children",
            post(session_routes::append_child),
        )
        .route(
            "/api/sessions/{id}/children/{kind}/{child_id}",
            delete(session_routes::remove_child),
        )
        .route(
            "/api/sessions/{id}/problems/{problem_id}/move",
            post(session_routes::move_problem),
        )
        .route(
            "/api/sessions/{id}/suggestions/{index}/confirm",
            post(session_routes::confirm_suggestion),
        )
        // Generation
        .route("/api/sessions/{id}/generate", post(session_routes::generate))
        .route(
            "/api/sessions/{id}/generate/cancel",
            post(session_routes::cancel_generation),
        )
        .route(
            "/api/sessions/{id}/drafts/{draft_id}/{action}",
            post(session_routes::review_draft),
        )
        .merge(settings_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{ContentGenerationPort, GenerationError};
    use crate::domain::value_objects::{GeneratedDraft, GenerationContext, GenerationKind};
    use crate::infrastructure::config::{AppConfig, MEMORY_DATABASE_URL};
    use crate::infrastructure::persistence::{
        InMemoryCircleRepository, InMemorySettingsRepository,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct CannedGenerator;

    #[async_trait]
    impl ContentGenerationPort for CannedGenerator {
        async fn generate(
            &self,
            _kind: GenerationKind,
            _context: &GenerationContext,
        ) -> Result<GeneratedDraft, GenerationError> {
            Ok(GeneratedDraft::Titles(vec![
                "Leads go cold".to_string(),
                "Slow quotes".to_string(),
            ]))
        }
    }

    fn app() -> Router {
        let config = AppConfig {
            database_url: MEMORY_DATABASE_URL.to_string(),
            ollama_base_url: "http://localhost:11434/v1".to_string(),
            ollama_model: "test".to_string(),
            server_port: 0,
        };
        let state = AppState::from_ports(
            config,
            Arc::new(InMemoryCircleRepository::new()),
            Arc::new(InMemorySettingsRepository::new()),
            Arc::new(CannedGenerator),
        );
        create_routes().with_state(Arc::new(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn open(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", Some(json!({ "client_id": 1 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_advance_without_industries_is_unprocessable() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/sessions",
            Some(json!({ "client_id": 1, "service_area_id": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["session_id"].as_str().unwrap().to_string();
        let advance = format!("/api/sessions/{}/advance", id);

        for expected in ["service_area", "existing_assets", "industries"] {
            let (status, body) = send(&app, "POST", &advance, None).await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            assert_eq!(body["position"]["step"], expected);
        }

        let (status, body) = send(&app, "POST", &advance, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["step"], "industries");
        assert!(body["violations"].as_array().is_some_and(|v| !v.is_empty()));

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/jump", id),
            Some(json!({ "step": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["position"]["step"], "service_area");
    }

    #[tokio::test]
    async fn test_generate_then_confirm_suggestion() {
        let app = app();
        let id = open(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/generate", id),
            Some(json!({ "kind": "problem_titles" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert!(body["pending"].is_null());

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/suggestions/0/confirm", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let problems = body["data"]["problems"].as_object().unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems.values().next().unwrap()["title"],
            "Leads go cold"
        );
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_sessions_are_not_found() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let missing = uuid::Uuid::new_v4();
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_close_session() {
        let app = app();
        let id = open(&app).await;
        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_child_kind_and_draft_action() {
        let app = app();
        let id = open(&app).await;
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/sessions/{}/children/planet/1", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/drafts/1/frobnicate", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let app = app();
        let (status, mut settings) = send(&app, "GET", "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        settings["max_problems"] = json!(0);
        let (status, _) = send(&app, "PUT", "/api/settings", Some(settings)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
