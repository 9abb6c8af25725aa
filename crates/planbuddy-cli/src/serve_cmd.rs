use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::Instrument;
use uuid::Uuid;

use planbuddy_core::{FALLBACK_ERROR, GenerateError, PlanGenerator, PlanRequest, ValidationError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl AppError {
    pub fn bad_request(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
            details: None,
        }
    }

    pub fn generation(err: GenerateError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: FALLBACK_ERROR.to_string(),
            details: Some(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(generator: Arc<PlanGenerator>) -> Router {
    Router::new()
        .route("/plan", post(create_plan))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(generator)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(generator: Arc<PlanGenerator>, bind: &str, port: u16) -> Result<()> {
    let model = generator.model_name().to_string();
    let app = build_router(generator);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(%model, "planbuddy serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("planbuddy serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_plan(
    State(generator): State<Arc<PlanGenerator>>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::bad_request(ValidationError::NotAnObject))?;
    let request = PlanRequest::from_json(&value).map_err(|e| {
        tracing::debug!(error = %e, "rejected plan request");
        AppError::bad_request(e)
    })?;

    let span = tracing::info_span!("plan", request_id = %Uuid::new_v4(), horizon = %request.horizon);
    let plan = generator
        .generate(&request)
        .instrument(span.clone())
        .await
        .map_err(|e| {
            span.in_scope(|| tracing::error!(error = %e, "Error generating plan"));
            AppError::generation(e)
        })?;

    Ok(Json(plan).into_response())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use planbuddy_core::{ApiClient, ClientError, PlanGenerator};
    use planbuddy_store::Horizon;
    use planbuddy_test_utils::{
        ScriptedModel, fenced, plan_request_body, sample_generated_plan, sample_model_json,
    };

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn router_with(model: Arc<ScriptedModel>) -> axum::Router {
        super::build_router(Arc::new(PlanGenerator::new(model)))
    }

    async fn post_raw(app: axum::Router, body: impl Into<Body>) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/plan")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn post_json(app: axum::Router, body: serde_json::Value) -> axum::response::Response {
        post_raw(app, body.to_string()).await
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Serve the router on an ephemeral port and return its base URL.
    async fn spawn_server(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_health_ok() {
        let app = router_with(Arc::new(ScriptedModel::replying("")));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_health_unaffected_by_failures() {
        let model = Arc::new(ScriptedModel::failing(500, "boom"));
        let app = router_with(model);

        let resp = post_json(app.clone(), plan_request_body("g", "today")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_plan_success() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let resp = post_json(router_with(model), plan_request_body("Write", "today")).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let tasks = json["tasks"].as_array().expect("tasks array");
        assert_eq!(tasks.len(), 3);
        for task in tasks {
            for field in ["id", "title", "dueDate", "priority", "notes", "emoji"] {
                assert!(task.get(field).is_some(), "task missing {field}: {task}");
            }
            assert!(task.get("completed").is_none());
        }
    }

    #[tokio::test]
    async fn test_plan_fenced_empty_tasks() {
        let model = Arc::new(ScriptedModel::replying("```json\n{\"tasks\":[]}\n```"));
        let resp = post_json(router_with(model), plan_request_body("g", "week")).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({"tasks": []}));
    }

    #[tokio::test]
    async fn test_plan_missing_goal() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let resp = post_json(
            router_with(model.clone()),
            serde_json::json!({"horizon": "today"}),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Goal is required and must be a string");
        assert_eq!(model.call_count(), 0, "model must not be called");
    }

    #[tokio::test]
    async fn test_plan_whitespace_goal_reaches_model() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let resp = post_json(router_with(model.clone()), plan_request_body("   ", "today")).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(model.call_count(), 1);
        assert!(model.prompts()[0].contains("Goal:    "));
    }

    #[tokio::test]
    async fn test_plan_bad_horizon() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let resp = post_json(router_with(model.clone()), plan_request_body("g", "month")).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Horizon must be \"today\" or \"week\"");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_non_json_body() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let resp = post_raw(router_with(model.clone()), "goal=x").await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await.get("error").is_some());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_unparseable_model_output() {
        let model = Arc::new(ScriptedModel::replying("I'd suggest going for a walk."));
        let resp = post_json(router_with(model), plan_request_body("g", "today")).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to generate plan");
        assert!(
            json["details"]
                .as_str()
                .unwrap()
                .contains("not valid JSON"),
            "details: {}",
            json["details"]
        );
    }

    #[tokio::test]
    async fn test_plan_malformed_tasks_rejected() {
        let model = Arc::new(ScriptedModel::replying(fenced(
            r#"{"tasks":[{"id":"a","title":"x","dueDate":"soon","priority":"high"}]}"#,
        )));
        let resp = post_json(router_with(model), plan_request_body("g", "today")).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to generate plan");
        assert!(json["details"].as_str().unwrap().contains("dueDate"));
    }

    #[tokio::test]
    async fn test_plan_model_failure() {
        let model = Arc::new(ScriptedModel::failing(503, "model overloaded"));
        let resp = post_json(router_with(model.clone()), plan_request_body("g", "today")).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to generate plan");
        assert_eq!(json["details"], "API error 503: model overloaded");
        assert_eq!(model.call_count(), 1, "no retry");
    }

    #[tokio::test]
    async fn test_client_roundtrip() {
        let model = Arc::new(ScriptedModel::replying(fenced(&sample_model_json())));
        let base = spawn_server(router_with(model)).await;
        let client = ApiClient::new(base);

        let plan = client.generate_plan("Write", Horizon::Today).await.unwrap();
        assert_eq!(plan, sample_generated_plan());

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_client_surfaces_error_envelope() {
        let model = Arc::new(ScriptedModel::failing(500, "nope"));
        let base = spawn_server(router_with(model)).await;
        let client = ApiClient::new(base);

        let err = client
            .generate_plan("Write", Horizon::Week)
            .await
            .unwrap_err();
        match err {
            ClientError::Api {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to generate plan");
                assert_eq!(details.as_deref(), Some("API error 500: nope"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generation_failure_uses_client_fallback_message() {
        let model = Arc::new(ScriptedModel::replying("not json"));
        let resp = post_json(router_with(model), plan_request_body("g", "today")).await;

        assert_eq!(body_json(resp).await["error"], planbuddy_core::FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn test_client_validation_message() {
        let model = Arc::new(ScriptedModel::replying(sample_model_json()));
        let base = spawn_server(router_with(model)).await;
        let client = ApiClient::new(base);

        let err = client.generate_plan("", Horizon::Today).await.unwrap_err();
        assert_eq!(err.to_string(), "Goal is required and must be a string");
    }
}
