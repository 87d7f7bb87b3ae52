use axum::Router;

use vertilog::{router, AppState, TokenConfig};

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// The full application router over fresh in-memory storage
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestAppBuilder {
    token_expiration_hours: i64,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            token_expiration_hours: 1,
        }
    }

    pub fn with_token_expiration_hours(mut self, hours: i64) -> Self {
        self.token_expiration_hours = hours;
        self
    }

    pub fn build(self) -> TestApp {
        let state = AppState::in_memory(TokenConfig::new(
            TEST_SECRET,
            self.token_expiration_hours,
        ));

        TestApp {
            router: router::routes(state.clone()),
            state,
        }
    }
}
