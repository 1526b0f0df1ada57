//! HTTP upload surface.
//!
//! A browser session walks through: create a session, list calendars,
//! upload the roster PDF, preview one person's shifts, import them.
//!
//! ```text
//! POST   /sessions                  -> {session_id}
//! GET    /sessions/:id/calendars    -> [CalendarInfo]
//! POST   /sessions/:id/roster       multipart `work_plan` -> {people}
//! POST   /sessions/:id/preview      {person} -> EventPlan
//! POST   /sessions/:id/import       {person, calendar_id} -> ImportSummary
//! DELETE /sessions/:id
//! GET    /health
//! ```
//!
//! Errors are JSON `{error, message}` bodies.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shiftcal_core::{EventPlan, RosterError};
use shiftcal_providers::CalendarInfo;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::extract::{PdfTableExtractor, TableExtractor, has_extension};
use crate::pipeline::{ImportSummary, Pipeline, PipelineError};
use crate::session::{Session, SessionId, SessionStore};

/// Multipart field carrying the roster file.
pub const UPLOAD_FIELD: &str = "work_plan";

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Pipeline,
    sessions: Arc<SessionStore>,
    extractor: Arc<dyn TableExtractor>,
}

impl AppState {
    /// Creates state that reads uploads as PDF.
    pub fn new(pipeline: Pipeline, sessions: SessionStore) -> Self {
        Self {
            pipeline,
            sessions: Arc::new(sessions),
            extractor: Arc::new(PdfTableExtractor::new()),
        }
    }

    /// Replaces the table extractor used for uploads.
    pub fn with_extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Conflict(String),
    Unauthorized(String),
    TooLarge(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    fn unknown_session(id: &str) -> Self {
        ApiError::NotFound(format!("session {id} not found"))
    }
}

impl From<PipelineError> for ApiError {
    fn from(value: PipelineError) -> Self {
        let message = value.to_string();
        match value {
            PipelineError::Roster(RosterError::PersonNotFound { .. }) => ApiError::NotFound(message),
            PipelineError::Roster(_) => ApiError::Invalid(message),
            e if e.is_auth() => ApiError::Unauthorized(message),
            _ => ApiError::BadGateway(message),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(value.body_text())
        } else {
            ApiError::Invalid(value.body_text())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
            ApiError::Invalid(m) => (StatusCode::BAD_REQUEST, "invalid_request", m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m),
            ApiError::TooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", m),
            ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, "provider_error", m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", m),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: SessionId,
}

#[derive(Debug, Serialize)]
struct RosterUploaded {
    rows: usize,
    people: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    person: String,
}

#[derive(Debug, Deserialize)]
struct ImportRequest {
    person: String,
    calendar_id: String,
}

/// Builds the router with the given upload size cap.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", delete(delete_session))
        .route("/sessions/:id/calendars", get(list_calendars))
        .route("/sessions/:id/roster", post(upload_roster))
        .route("/sessions/:id/preview", post(preview))
        .route("/sessions/:id/import", post(import))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Serves the upload surface until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> ServerResult<()> {
    let app = router(state, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_id(&id)?;
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::unknown_session(&id))
    }
}

async fn list_calendars(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CalendarInfo>>, ApiError> {
    let session_id = parse_id(&id)?;
    load_session(&state, session_id, &id).await?;

    let calendars = state.pipeline.calendars().await.map_err(|e| {
        warn!(session = %session_id, error = %e, "listing calendars failed");
        ApiError::from(e)
    })?;

    if !state
        .sessions
        .set_calendars(session_id, calendars.clone())
        .await
    {
        return Err(ApiError::unknown_session(&id));
    }
    Ok(Json(calendars))
}

async fn upload_roster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<RosterUploaded>, ApiError> {
    let session_id = parse_id(&id)?;
    load_session(&state, session_id, &id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if !has_extension(FsPath::new(&file_name), "pdf") {
            return Err(ApiError::Invalid(format!(
                "'{file_name}' is not a PDF file"
            )));
        }
        upload = Some((file_name, field.bytes().await?));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| ApiError::Invalid(format!("missing '{UPLOAD_FIELD}' file field")))?;
    debug!(session = %session_id, file = %file_name, bytes = data.len(), "roster uploaded");

    let extractor = state.extractor.clone();
    let table = tokio::task::spawn_blocking(move || extractor.extract(&data))
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {e}")))?
        .map_err(|e| ApiError::Invalid(e.to_string()))?;

    let response = RosterUploaded {
        rows: table.row_count(),
        people: table.people().into_iter().map(String::from).collect(),
    };
    if !state.sessions.set_roster(session_id, table).await {
        return Err(ApiError::unknown_session(&id));
    }

    info!(
        session = %session_id,
        file = %file_name,
        people = response.people.len(),
        "roster stored"
    );
    Ok(Json(response))
}

async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<EventPlan>, ApiError> {
    let session_id = parse_id(&id)?;
    let Json(request) = payload?;
    let session = load_session(&state, session_id, &id).await?;
    let roster = require_roster(&session)?;

    let plan = state.pipeline.plan(&roster, &request.person)?;
    Ok(Json(plan))
}

async fn import(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportSummary>, ApiError> {
    let session_id = parse_id(&id)?;
    let Json(request) = payload?;
    let session = load_session(&state, session_id, &id).await?;
    let roster = require_roster(&session)?;

    if !session.allows_calendar(&request.calendar_id) {
        return Err(ApiError::Invalid(format!(
            "calendar '{}' was not offered to this session",
            request.calendar_id
        )));
    }

    let summary = state
        .pipeline
        .run(&roster, &request.person, &request.calendar_id)
        .await?;
    Ok(Json(summary))
}

fn parse_id(id: &str) -> Result<SessionId, ApiError> {
    id.parse().map_err(|_| ApiError::unknown_session(id))
}

async fn load_session(state: &AppState, session_id: SessionId, id: &str) -> Result<Session, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::unknown_session(id))
}

fn require_roster(session: &Session) -> Result<Arc<shiftcal_core::RosterTable>, ApiError> {
    session
        .roster
        .clone()
        .ok_or_else(|| ApiError::Conflict("no roster uploaded for this session".to_string()))
}
