// Public API - what other modules can use
pub use handlers::{get_climb, log_climb};
pub use service::ClimbService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
