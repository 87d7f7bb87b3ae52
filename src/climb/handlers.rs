use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::ClimbModel,
    service::ClimbService,
    types::{LogClimbRequest, LogClimbResponse},
};
use crate::auth::UserClaims;
use crate::shared::{bind_input, messages, AppError, AppState, ApiError};

const LOG_CLIMB_FAILED: &str = "We couldn't log your climb. Please try again later.";
const CLIMB_NOT_FOUND: &str = "Climb not found.";

fn climb_service(state: &AppState) -> ClimbService {
    ClimbService::new(
        Arc::clone(&state.climb_repository),
        Arc::clone(&state.session_repository),
    )
}

/// HTTP handler for logging a climb
///
/// POST /app/logClimb
/// Files the climb under the session for its date
#[instrument(name = "log_climb", skip(state, claims, payload), fields(user_id = claims.user_id))]
pub async fn log_climb(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    payload: Result<Json<LogClimbRequest>, JsonRejection>,
) -> Result<Json<LogClimbResponse>, ApiError> {
    let Json(request) = bind_input(payload)?;

    let climb = climb_service(&state)
        .log_climb(claims.user_id, request)
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e.respond(StatusCode::BAD_REQUEST, messages::INVALID_INPUT),
            e => e.respond(StatusCode::INTERNAL_SERVER_ERROR, LOG_CLIMB_FAILED),
        })?;

    info!(climb_id = climb.id, session_id = climb.session_id, "Climb logged successfully");

    Ok(Json(LogClimbResponse {
        message: "Climb logged successfully".to_string(),
        climb,
    }))
}

/// HTTP handler for reading one climb
///
/// GET /app/climbs/:id
#[instrument(name = "get_climb", skip(state, claims, climb_id), fields(user_id = claims.user_id))]
pub async fn get_climb(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    climb_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ClimbModel>, ApiError> {
    let Path(climb_id) = bind_input(climb_id)?;

    let climb = climb_service(&state)
        .get_climb(claims.user_id, climb_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => e.respond(StatusCode::NOT_FOUND, CLIMB_NOT_FOUND),
            e => e.respond(StatusCode::INTERNAL_SERVER_ERROR, messages::INTERNAL),
        })?;

    Ok(Json(climb))
}
