use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{SessionSummary, SessionWithClimbs},
    service::SessionService,
    types::SummaryParams,
};
use crate::auth::UserClaims;
use crate::pagination::PageParams;
use crate::shared::{bind_input, messages, AppError, AppState, ApiError};

const SESSIONS_FAILED: &str = "We couldn't load your sessions. Please try again later.";
const SESSION_NOT_FOUND: &str = "Session not found.";
const SUMMARIES_FAILED: &str = "We couldn't load your session summaries. Please try again later.";

fn session_service(state: &AppState) -> SessionService {
    SessionService::new(Arc::clone(&state.session_repository))
}

/// Validation failures answer 400 and missing sessions 404; anything else gets `status`
fn respond(e: AppError, status: StatusCode, message: &'static str) -> ApiError {
    match e {
        AppError::Validation(_) => e.respond(StatusCode::BAD_REQUEST, messages::INVALID_INPUT),
        AppError::NotFound(_) => e.respond(StatusCode::NOT_FOUND, SESSION_NOT_FOUND),
        e => e.respond(status, message),
    }
}

/// HTTP handler for listing the user's sessions
///
/// GET /app/sessions?offset=&limit=
/// Returns sessions newest first, each with all of its climbs
#[instrument(name = "list_sessions", skip(state, claims, params), fields(user_id = claims.user_id))]
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<SessionWithClimbs>>, ApiError> {
    let Query(params) = bind_input(params)?;
    let page = params
        .into_page()
        .map_err(|e| respond(e, StatusCode::BAD_REQUEST, messages::INVALID_INPUT))?;

    let sessions = session_service(&state)
        .list_sessions(claims.user_id, page)
        .await
        .map_err(|e| respond(e, StatusCode::INTERNAL_SERVER_ERROR, SESSIONS_FAILED))?;

    Ok(Json(sessions))
}

/// HTTP handler for reading one session
///
/// GET /app/sessions/:id?offset=&limit=
/// The page applies to the session's climbs
#[instrument(name = "get_session", skip(state, claims, session_id, params), fields(user_id = claims.user_id))]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    session_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<SessionWithClimbs>, ApiError> {
    let Path(session_id) = bind_input(session_id)?;
    let Query(params) = bind_input(params)?;
    let climb_page = params
        .into_page()
        .map_err(|e| respond(e, StatusCode::BAD_REQUEST, messages::INVALID_INPUT))?;

    let session = session_service(&state)
        .get_session(claims.user_id, session_id, climb_page)
        .await
        .map_err(|e| respond(e, StatusCode::INTERNAL_SERVER_ERROR, SESSIONS_FAILED))?;

    info!(session_id, climb_count = session.climbs.len(), "Session fetched");
    Ok(Json(session))
}

/// HTTP handler for reading the session on a date
///
/// GET /app/days/:date
#[instrument(name = "get_session_by_date", skip(state, claims, date), fields(user_id = claims.user_id))]
pub async fn get_session_by_date(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<Json<SessionWithClimbs>, ApiError> {
    let Path(date) = bind_input(date)?;

    let session = session_service(&state)
        .get_session_by_date(claims.user_id, date)
        .await
        .map_err(|e| respond(e, StatusCode::INTERNAL_SERVER_ERROR, SESSIONS_FAILED))?;

    Ok(Json(session))
}

/// HTTP handler for per-session load over a date range
///
/// GET /app/summaries?start=YYYY-MM-DD&end=YYYY-MM-DD
#[instrument(name = "get_session_summaries", skip(state, claims, params), fields(user_id = claims.user_id))]
pub async fn get_session_summaries(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let Query(params) = bind_input(params)?;

    let summaries = session_service(&state)
        .get_summaries(claims.user_id, params.start, params.end)
        .await
        .map_err(|e| respond(e, StatusCode::INTERNAL_SERVER_ERROR, SUMMARIES_FAILED))?;

    Ok(Json(summaries))
}
