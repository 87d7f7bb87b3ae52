use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, climb, session, shared::AppState, user};

/// Builds the application router.
///
/// Public routes: `POST /register`, `POST /login`, `GET /health`.
/// Everything under `/app` requires a bearer JWT.
pub fn routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/register", post(user::register))
        .route("/login", post(user::login));

    let protected = Router::new()
        .route("/profile", put(user::update_profile))
        .route("/sessions", get(session::list_sessions))
        .route("/sessions/:id", get(session::get_session))
        .route("/days/:date", get(session::get_session_by_date))
        .route("/summaries", get(session::get_session_summaries))
        .route("/logClimb", post(climb::log_climb))
        .route("/climbs/:id", get(climb::get_climb))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

    public
        .nest("/app", protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
