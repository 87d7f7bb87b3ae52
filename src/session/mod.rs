// Public API - what other modules can use
pub use handlers::{get_session, get_session_by_date, get_session_summaries, list_sessions};
pub use service::SessionService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
