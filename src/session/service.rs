use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{SessionSummary, SessionWithClimbs},
    repository::SessionRepository,
};
use crate::pagination::Page;
use crate::shared::AppError;

/// Service for reading a user's sessions
pub struct SessionService {
    repository: Arc<dyn SessionRepository + Send + Sync>,
}

impl SessionService {
    pub fn new(repository: Arc<dyn SessionRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Lists the user's sessions, newest first
    #[instrument(skip(self))]
    pub async fn list_sessions(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<SessionWithClimbs>, AppError> {
        let sessions = self.repository.find_all_sessions(user_id, page).await?;
        info!(session_count = sessions.len(), "Sessions listed");
        Ok(sessions)
    }

    /// Gets one session with a page of its climbs
    #[instrument(skip(self))]
    pub async fn get_session(
        &self,
        user_id: i64,
        session_id: i64,
        climb_page: Page,
    ) -> Result<SessionWithClimbs, AppError> {
        self.repository
            .find_by_id(user_id, session_id, climb_page)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Session with id {} not found for user with id {}",
                    session_id, user_id
                ))
            })
    }

    /// Gets the session on a given date
    #[instrument(skip(self))]
    pub async fn get_session_by_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<SessionWithClimbs, AppError> {
        self.repository
            .find_by_date(user_id, date)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Session on date {} not found for user with id {}",
                    date, user_id
                ))
            })
    }

    /// Load per session over an inclusive date range
    #[instrument(skip(self))]
    pub async fn get_summaries(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SessionSummary>, AppError> {
        if start > end {
            return Err(AppError::Validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let summaries = self
            .repository
            .find_session_summaries(user_id, start, end)
            .await?;
        info!(summary_count = summaries.len(), "Session summaries computed");
        Ok(summaries)
    }
}
