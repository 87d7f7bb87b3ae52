use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::models::{ClimbModel, NewClimb};
use crate::shared::AppError;
use crate::storage::InMemoryStore;

/// Trait for climb repository operations
#[async_trait]
pub trait ClimbRepository {
    async fn create_climb(&self, climb: &NewClimb) -> Result<ClimbModel, AppError>;
    /// Looks up a climb through its session, so only the owner can see it
    async fn find_by_id(&self, user_id: i64, climb_id: i64)
        -> Result<Option<ClimbModel>, AppError>;
}

/// In-memory implementation of ClimbRepository for development and testing
pub struct InMemoryClimbRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryClimbRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    /// Returns the current number of climbs in the repository
    pub async fn climb_count(&self) -> usize {
        self.store.climbs.read().await.len()
    }
}

#[async_trait]
impl ClimbRepository for InMemoryClimbRepository {
    #[instrument(skip(self, climb), fields(session_id = climb.session_id))]
    async fn create_climb(&self, climb: &NewClimb) -> Result<ClimbModel, AppError> {
        debug!("Creating climb in memory");

        // Lock order: sessions before climbs
        let sessions = self.store.sessions.read().await;
        if sessions.get(climb.session_id).is_none() {
            warn!("Session not found for climb in memory");
            return Err(AppError::DatabaseError(format!(
                "Error creating climb: session with id {} does not exist",
                climb.session_id
            )));
        }

        let mut climbs = self.store.climbs.write().await;
        let now = Utc::now();
        let id = climbs.next_id();
        let model = ClimbModel {
            id,
            session_id: climb.session_id,
            grade: climb.grade.clone(),
            attempts: climb.attempts,
            sent: climb.sent,
            load: climb.load,
            notes: climb.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        climbs.insert(id, model.clone());

        debug!(climb_id = id, "Climb created successfully in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        user_id: i64,
        climb_id: i64,
    ) -> Result<Option<ClimbModel>, AppError> {
        let sessions = self.store.sessions.read().await;
        let climbs = self.store.climbs.read().await;

        let climb = climbs.get(climb_id).filter(|c| {
            sessions
                .get(c.session_id)
                .is_some_and(|s| s.user_id == user_id)
        });

        Ok(climb.cloned())
    }
}

/// PostgreSQL implementation of climb repository
pub struct PostgresClimbRepository {
    pool: PgPool,
}

impl PostgresClimbRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClimbRepository for PostgresClimbRepository {
    #[instrument(skip(self, climb), fields(session_id = climb.session_id))]
    async fn create_climb(&self, climb: &NewClimb) -> Result<ClimbModel, AppError> {
        debug!("Creating climb in database");

        sqlx::query_as::<_, ClimbModel>(
            "INSERT INTO climbs (session_id, grade, attempts, sent, load, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, session_id, grade, attempts, sent, load, notes, created_at, updated_at",
        )
        .bind(climb.session_id)
        .bind(&climb.grade)
        .bind(climb.attempts)
        .bind(climb.sent)
        .bind(climb.load)
        .bind(&climb.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create climb in database");
            AppError::DatabaseError(format!(
                "Error creating climb in session with id {}: {}",
                climb.session_id, e
            ))
        })
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        user_id: i64,
        climb_id: i64,
    ) -> Result<Option<ClimbModel>, AppError> {
        sqlx::query_as::<_, ClimbModel>(
            "SELECT climbs.id, climbs.session_id, climbs.grade, climbs.attempts, climbs.sent, \
                    climbs.load, climbs.notes, climbs.created_at, climbs.updated_at \
             FROM climbs JOIN sessions ON sessions.id = climbs.session_id \
             WHERE climbs.id = $1 AND sessions.user_id = $2",
        )
        .bind(climb_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch climb from database");
            AppError::DatabaseError(format!(
                "Error finding climb with id {} for user with id {}: {}",
                climb_id, user_id, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::repository::{InMemorySessionRepository, SessionRepository};
    use chrono::NaiveDate;

    fn new_climb(session_id: i64) -> NewClimb {
        NewClimb {
            session_id,
            grade: "6b+".to_string(),
            attempts: 3,
            sent: false,
            load: 12.5,
            notes: "crimpy".to_string(),
        }
    }

    async fn session_for(store: &Arc<InMemoryStore>, user_id: i64) -> i64 {
        InMemorySessionRepository::new(store.clone())
            .create_session(user_id, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_and_find_climb() {
        let store = Arc::new(InMemoryStore::new());
        let session_id = session_for(&store, 1).await;
        let repo = InMemoryClimbRepository::new(store);

        let created = repo.create_climb(&new_climb(session_id)).await.unwrap();
        assert_eq!(created.session_id, session_id);
        assert_eq!(created.grade, "6b+");

        let found = repo.find_by_id(1, created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_find_climb_of_other_user_is_none() {
        let store = Arc::new(InMemoryStore::new());
        let session_id = session_for(&store, 1).await;
        let repo = InMemoryClimbRepository::new(store);
        let created = repo.create_climb(&new_climb(session_id)).await.unwrap();

        assert!(repo.find_by_id(2, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_climb_without_session_fails() {
        let repo = InMemoryClimbRepository::new(Arc::new(InMemoryStore::new()));

        let result = repo.create_climb(&new_climb(42)).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert_eq!(repo.climb_count().await, 0);
    }
}
