// Library crate for the VertiLog climbing log server
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod climb;
pub mod config;
pub mod pagination;
pub mod router;
pub mod session;
pub mod shared;
pub mod storage;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{TokenConfig, UserClaims};
pub use config::AppConfig;
pub use pagination::Page;
pub use shared::{ApiError, AppError, AppState};
