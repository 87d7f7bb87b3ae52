use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::UserService,
    types::{
        CredentialsRequest, LoginResponse, MessageResponse, PasswordUpdateRequest,
        RegisterResponse,
    },
};
use crate::auth::UserClaims;
use crate::shared::{bind_input, messages, AppError, AppState, ApiError};

const REGISTRATION_FAILED: &str =
    "We encountered an issue while registering your account. Please try again later.";
const USERNAME_TAKEN: &str = "That username is already taken. Please choose another.";
const INVALID_CREDENTIALS: &str =
    "Invalid username or password. Please check your credentials and try again.";
const INVALID_PASSWORD: &str = "Invalid password. Please check your credentials and try again.";

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
    )
}

/// HTTP handler for registering a new user
///
/// POST /register
/// Returns a confirmation message and the new user's id
#[instrument(name = "register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(request) = bind_input(payload)?;
    info!(username = %request.username, "Registering new user");

    let user = UserService::prepare_user(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e.respond(StatusCode::BAD_REQUEST, messages::INVALID_INPUT),
            e => e.respond(StatusCode::INTERNAL_SERVER_ERROR, messages::INTERNAL),
        })?;

    let created = user_service(&state)
        .create_user(&user)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => e.respond(StatusCode::CONFLICT, USERNAME_TAKEN),
            e => e.respond(StatusCode::INTERNAL_SERVER_ERROR, REGISTRATION_FAILED),
        })?;

    Ok(Json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user_id: created.id,
    }))
}

/// HTTP handler for logging in
///
/// POST /login
/// Returns a bearer JWT
#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = bind_input(payload)?;

    let token = user_service(&state)
        .verify_user(&request.username, &request.password)
        .await
        .map_err(|e| e.respond(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS))?;

    Ok(Json(LoginResponse { token }))
}

/// HTTP handler for changing the authenticated user's password
///
/// PUT /app/profile
#[instrument(name = "update_profile", skip(state, claims, payload), fields(user_id = claims.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    payload: Result<Json<PasswordUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = bind_input(payload)?;

    user_service(&state)
        .update_password(
            claims.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e.respond(StatusCode::BAD_REQUEST, messages::INVALID_INPUT),
            e => e.respond(StatusCode::UNAUTHORIZED, INVALID_PASSWORD),
        })?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
