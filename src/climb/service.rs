use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{ClimbModel, NewClimb},
    repository::ClimbRepository,
    types::LogClimbRequest,
};
use crate::session::repository::SessionRepository;
use crate::shared::AppError;

pub const MAX_GRADE_LEN: usize = 16;

/// Service for logging and reading climbs
pub struct ClimbService {
    climbs: Arc<dyn ClimbRepository + Send + Sync>,
    sessions: Arc<dyn SessionRepository + Send + Sync>,
}

impl ClimbService {
    pub fn new(
        climbs: Arc<dyn ClimbRepository + Send + Sync>,
        sessions: Arc<dyn SessionRepository + Send + Sync>,
    ) -> Self {
        Self { climbs, sessions }
    }

    /// Logs a climb into the user's session on `request.date`,
    /// creating that session if it does not exist yet
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn log_climb(
        &self,
        user_id: i64,
        request: LogClimbRequest,
    ) -> Result<ClimbModel, AppError> {
        validate(&request)?;

        let session_id = self.session_for_date(user_id, &request).await?;

        let climb = self
            .climbs
            .create_climb(&NewClimb {
                session_id,
                grade: request.grade.trim().to_string(),
                attempts: request.attempts,
                sent: request.sent,
                load: request.load,
                notes: request.notes,
            })
            .await?;

        info!(climb_id = climb.id, session_id, "Climb logged");
        Ok(climb)
    }

    /// Gets one of the user's climbs
    #[instrument(skip(self))]
    pub async fn get_climb(&self, user_id: i64, climb_id: i64) -> Result<ClimbModel, AppError> {
        self.climbs
            .find_by_id(user_id, climb_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Climb with id {} not found for user with id {}",
                    climb_id, user_id
                ))
            })
    }

    async fn session_for_date(
        &self,
        user_id: i64,
        request: &LogClimbRequest,
    ) -> Result<i64, AppError> {
        if let Some(existing) = self.sessions.find_by_date(user_id, request.date).await? {
            debug!(session_id = existing.session.id, "Using existing session");
            return Ok(existing.session.id);
        }

        match self
            .sessions
            .create_session(user_id, request.date, "")
            .await
        {
            Ok(session) => {
                info!(session_id = session.id, "Created session for climb");
                Ok(session.id)
            }
            Err(AppError::Conflict(_)) => {
                // Lost a race with a concurrent insert for the same date
                warn!("Session created concurrently, reloading");
                self.sessions
                    .find_by_date(user_id, request.date)
                    .await?
                    .map(|existing| existing.session.id)
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "Session on date {} vanished for user with id {}",
                            request.date, user_id
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }
}

fn validate(request: &LogClimbRequest) -> Result<(), AppError> {
    let grade = request.grade.trim();
    if grade.is_empty() || grade.chars().count() > MAX_GRADE_LEN {
        return Err(AppError::Validation(format!(
            "grade must be between 1 and {} characters",
            MAX_GRADE_LEN
        )));
    }
    if request.attempts < 1 {
        return Err(AppError::Validation(
            "attempts must be at least 1".to_string(),
        ));
    }
    if !request.load.is_finite() || request.load < 0.0 {
        return Err(AppError::Validation(
            "load must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
