use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::TokenConfig;
use crate::climb::repository::{ClimbRepository, InMemoryClimbRepository, PostgresClimbRepository};
use crate::session::repository::{
    InMemorySessionRepository, PostgresSessionRepository, SessionRepository,
};
use crate::storage::InMemoryStore;
use crate::user::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};

/// Fixed client-facing messages. Internal detail only goes to the log.
pub mod messages {
    pub const INVALID_INPUT: &str = "Invalid input. Please check the submitted data and try again.";
    pub const INVALID_TOKEN: &str =
        "Authorization token is invalid or missing. Please log in and try again.";
    pub const INTERNAL: &str =
        "An error occurred while processing your request. Please try again later.";
}

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub session_repository: Arc<dyn SessionRepository + Send + Sync>,
    pub climb_repository: Arc<dyn ClimbRepository + Send + Sync>,
    pub token_config: TokenConfig,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        climb_repository: Arc<dyn ClimbRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            user_repository,
            session_repository,
            climb_repository,
            token_config,
        }
    }

    /// State backed by a single in-memory store shared by all repositories
    pub fn in_memory(token_config: TokenConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(
            Arc::new(InMemoryUserRepository::new(store.clone())),
            Arc::new(InMemorySessionRepository::new(store.clone())),
            Arc::new(InMemoryClimbRepository::new(store)),
            token_config,
        )
    }

    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, token_config: TokenConfig) -> Self {
        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresSessionRepository::new(pool.clone())),
            Arc::new(PostgresClimbRepository::new(pool)),
            token_config,
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a client response with a fixed message.
    /// The underlying error is logged and dropped.
    pub fn respond(self, status: StatusCode, message: &'static str) -> ApiError {
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        ApiError::new(status, message)
    }
}

/// Error returned to HTTP clients: a status and a fixed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    pub fn invalid_input(reason: impl Display) -> Self {
        warn!(reason = %reason, "Rejected request input");
        Self::new(StatusCode::BAD_REQUEST, messages::INVALID_INPUT)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Unwraps an extractor result, mapping any rejection to a 400.
pub fn bind_input<T, R: Display>(extracted: Result<T, R>) -> Result<T, ApiError> {
    extracted.map_err(ApiError::invalid_input)
}
