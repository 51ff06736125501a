//! JSON API around the answer router.
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: Option<String>,
    #[serde(default)]
    auto_refresh: bool,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/chat", post(chat))
        .route("/api/refresh", post(refresh))
        .route("/api/status", get(status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}

fn now() -> String { Utc::now().to_rfc3339() }

fn error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn home(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "service": state.service(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now(),
    }))
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<ChatRequest>(&body).ok();
    let Some((question, auto_refresh)) = request.and_then(|r| r.question.map(|q| (q.trim().to_string(), r.auto_refresh))) else {
        return error(StatusCode::BAD_REQUEST, "Missing required field: question".into());
    };
    if question.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Question cannot be empty".into());
    }
    match tokio::task::spawn_blocking(move || state.ask(&question, auto_refresh)).await {
        Ok(answer) => Json(json!({ "answer": answer, "timestamp": now() })).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Internal server error: {}", e)),
    }
}

async fn refresh(State(state): State<AppState>) -> Response {
    match tokio::task::spawn_blocking(move || state.refresh()).await {
        Ok(Ok(())) => Json(json!({
            "status": "success",
            "message": "Knowledge base refreshed successfully",
            "timestamp": now(),
        }))
        .into_response(),
        Ok(Err(e)) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Refresh failed: {:#}", e)),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Refresh failed: {}", e)),
    }
}

async fn status(State(state): State<AppState>) -> Response {
    let checked = state.clone();
    match tokio::task::spawn_blocking(move || checked.updates_available()).await {
        Ok(Ok(updates_available)) => Json(json!({
            "status": "ready",
            "last_loaded": state.last_loaded().to_rfc3339(),
            "updates_available": updates_available,
            "timestamp": now(),
        }))
        .into_response(),
        Ok(Err(e)) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Status check failed: {:#}", e)),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, format!("Status check failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{router_over, FakeLoader};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const PASSAGE: &str = "Riding lessons are offered on weekends for riders of every age group.";

    fn state(loader: std::sync::Arc<FakeLoader>) -> AppState {
        AppState::new(loader, router_over(PASSAGE), "SBYEC Chatbot API")
    }

    async fn call(state: AppState, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn home_reports_online() {
        let (status, body) = call(state(FakeLoader::new(PASSAGE, false)), "GET", "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "online");
        assert_eq!(body["service"], "SBYEC Chatbot API");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn chat_answers_question() {
        let (status, body) = call(state(FakeLoader::new(PASSAGE, false)), "POST", "/api/chat", r#"{"question":"Tell me about the horses"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], PASSAGE);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn chat_rejects_missing_or_blank_question() {
        let (status, body) = call(state(FakeLoader::new(PASSAGE, false)), "POST", "/api/chat", r#"{"auto_refresh":true}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: question");

        let (status, body) = call(state(FakeLoader::new(PASSAGE, false)), "POST", "/api/chat", r#"{"question":"   "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Question cannot be empty");

        let (status, _) = call(state(FakeLoader::new(PASSAGE, false)), "POST", "/api/chat", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_and_status() {
        let loader = FakeLoader::new(PASSAGE, true);
        let app_state = state(loader.clone());

        let (status, body) = call(app_state.clone(), "GET", "/api/status", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["updates_available"], true);

        let (status, body) = call(app_state.clone(), "POST", "/api/refresh", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (_, body) = call(app_state, "GET", "/api/status", "").await;
        assert_eq!(body["updates_available"], false);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_refresh_is_500() {
        let (status, body) = call(state(FakeLoader::failing()), "POST", "/api/refresh", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Refresh failed"));
    }
}
