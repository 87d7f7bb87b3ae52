use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::shared::{messages, AppError, AppState, ApiError};

/// JWT authentication middleware - validates Authorization Bearer header and adds UserClaims to request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<UserClaims>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    info!(
        "JWT authentication middleware triggered for request {}",
        req.uri()
    );

    let unauthorized =
        |e: AppError| e.respond(StatusCode::UNAUTHORIZED, messages::INVALID_TOKEN);

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| unauthorized(AppError::Unauthorized("Missing authorization header".to_string())))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        unauthorized(AppError::Unauthorized(
            "Invalid authorization header format (expected Bearer token)".to_string(),
        ))
    })?;

    let claims = state.token_config.validate_token(token).map_err(unauthorized)?;

    // A valid signature is not enough: the user must still exist
    let user = state
        .user_repository
        .find_by_id(claims.user_id)
        .await
        .map_err(|e| e.respond(StatusCode::INTERNAL_SERVER_ERROR, messages::INTERNAL))?;

    if user.is_none() {
        warn!(user_id = claims.user_id, "Token refers to an unknown user");
        return Err(unauthorized(AppError::Unauthorized(format!(
            "User {} not found",
            claims.user_id
        ))));
    }

    info!(
        user_id = claims.user_id,
        username = %claims.username,
        "Authentication successful, adding claims to request"
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
