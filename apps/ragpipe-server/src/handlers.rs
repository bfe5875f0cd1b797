//! HTTP routes over the shared [`Pipeline`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use ragpipe_core::error::{ErrorKind, PipelineError};
use ragpipe_core::types::RetrievedResult;
use ragpipe_pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self { Self { pipeline } }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest_handler))
        .route("/query", post(query_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IngestResponse {
    pub status: &'static str,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub context: Vec<RetrievedResult>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error response with the status picked from the failure kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn pipeline(context: &str, err: PipelineError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            error!(kind = err.kind().as_str(), error = %err, "{context}");
        }
        Self { status, message: format!("{context}: {err}") }
    }

    pub fn status(&self) -> StatusCode { self.status }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NoContent => StatusCode::BAD_REQUEST,
        ErrorKind::NoResults => StatusCode::NOT_FOUND,
        ErrorKind::EmbeddingFailed | ErrorKind::AnswerFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::IndexWriteFailed | ErrorKind::SearchFailed | ErrorKind::Provisioning => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(format!("invalid request body: {}", rejection.body_text()))
}

pub async fn ingest_handler(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    if request.text.is_empty() {
        return Err(ApiError::bad_request("text is required"));
    }
    let report = state
        .pipeline
        .ingest(&request.text, &request.id)
        .await
        .map_err(|e| ApiError::pipeline("failed to ingest text", e))?;
    info!(doc_id = %report.doc_id, chunks = report.chunks, "ingest request served");
    Ok(Json(IngestResponse { status: "success", chunks: report.chunks }))
}

pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    if request.query.is_empty() {
        return Err(ApiError::bad_request("query is required"));
    }
    let answer = state
        .pipeline
        .answer(&request.query)
        .await
        .map_err(|e| ApiError::pipeline("failed to process query", e))?;
    Ok(Json(QueryResponse { answer: answer.answer, context: answer.context }))
}
