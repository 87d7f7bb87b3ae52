use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::models::{SessionModel, SessionSummary, SessionWithClimbs};
use crate::climb::models::ClimbModel;
use crate::pagination::Page;
use crate::shared::AppError;
use crate::storage::InMemoryStore;

/// Trait for session repository operations.
/// Every query is scoped to the given user.
#[async_trait]
pub trait SessionRepository {
    async fn create_session(
        &self,
        user_id: i64,
        date: NaiveDate,
        notes: &str,
    ) -> Result<SessionModel, AppError>;

    /// Sessions newest first, windowed by `page`, each with all of its climbs
    async fn find_all_sessions(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<SessionWithClimbs>, AppError>;

    /// One session with its climbs windowed by `climb_page`
    async fn find_by_id(
        &self,
        user_id: i64,
        session_id: i64,
        climb_page: Page,
    ) -> Result<Option<SessionWithClimbs>, AppError>;

    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<SessionWithClimbs>, AppError>;

    /// Summed climb load per session with `start <= date <= end`.
    /// Sessions without climbs are left out.
    async fn find_session_summaries(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SessionSummary>, AppError>;
}

/// In-memory implementation of SessionRepository for development and testing
pub struct InMemorySessionRepository {
    store: Arc<InMemoryStore>,
}

impl InMemorySessionRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    /// Returns the current number of sessions in the repository
    pub async fn session_count(&self) -> usize {
        self.store.sessions.read().await.len()
    }

    async fn climbs_of(&self, session_id: i64) -> Vec<ClimbModel> {
        let climbs = self.store.climbs.read().await;
        let mut found: Vec<ClimbModel> = climbs
            .values()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        found.sort_by(ClimbModel::newest_first);
        found
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, notes))]
    async fn create_session(
        &self,
        user_id: i64,
        date: NaiveDate,
        notes: &str,
    ) -> Result<SessionModel, AppError> {
        debug!("Creating session in memory");

        let mut sessions = self.store.sessions.write().await;
        if sessions
            .values()
            .any(|s| s.user_id == user_id && s.date == date)
        {
            warn!("Session already exists for this date in memory");
            return Err(AppError::Conflict(format!(
                "Session on date {} already exists for user with id {}",
                date, user_id
            )));
        }

        let now = Utc::now();
        let id = sessions.next_id();
        let session = SessionModel {
            id,
            user_id,
            date,
            notes: notes.to_string(),
            created_at: now,
            updated_at: now,
        };
        sessions.insert(id, session.clone());

        debug!(session_id = id, "Session created successfully in memory");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn find_all_sessions(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<SessionWithClimbs>, AppError> {
        let mut owned: Vec<SessionModel> = {
            let sessions = self.store.sessions.read().await;
            sessions
                .values()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect()
        };
        owned.sort_by(SessionModel::newest_first);

        let mut result = Vec::new();
        for session in page.apply(owned.into_iter()) {
            let climbs = self.climbs_of(session.id).await;
            result.push(SessionWithClimbs { session, climbs });
        }

        debug!(session_count = result.len(), "Sessions fetched from memory");
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        user_id: i64,
        session_id: i64,
        climb_page: Page,
    ) -> Result<Option<SessionWithClimbs>, AppError> {
        let session = {
            let sessions = self.store.sessions.read().await;
            sessions
                .get(session_id)
                .filter(|s| s.user_id == user_id)
                .cloned()
        };

        match session {
            Some(session) => {
                let climbs = climb_page.apply(self.climbs_of(session.id).await.into_iter());
                Ok(Some(SessionWithClimbs { session, climbs }))
            }
            None => {
                debug!("Session not found in memory");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<SessionWithClimbs>, AppError> {
        let session = {
            let sessions = self.store.sessions.read().await;
            sessions
                .values()
                .find(|s| s.user_id == user_id && s.date == date)
                .cloned()
        };

        match session {
            Some(session) => {
                let climbs = self.climbs_of(session.id).await;
                Ok(Some(SessionWithClimbs { session, climbs }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_session_summaries(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = self.store.sessions.read().await;
        let climbs = self.store.climbs.read().await;

        let mut loads: HashMap<i64, f64> = HashMap::new();
        for climb in climbs.values() {
            *loads.entry(climb.session_id).or_insert(0.0) += climb.load;
        }

        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.date >= start && s.date <= end)
            .filter_map(|s| {
                loads.get(&s.id).map(|load| SessionSummary {
                    id: s.id,
                    date: s.date,
                    load: *load,
                })
            })
            .collect();
        summaries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        Ok(summaries)
    }
}

/// PostgreSQL implementation of session repository.
/// Climbs are loaded with a second explicit query instead of a join fan-out.
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All climbs of the given sessions, grouped by session, newest first
    async fn load_climbs(
        &self,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ClimbModel>>, sqlx::Error> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let climbs = sqlx::query_as::<_, ClimbModel>(
            "SELECT id, session_id, grade, attempts, sent, load, notes, created_at, updated_at \
             FROM climbs WHERE session_id = ANY($1) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(session_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<ClimbModel>> = HashMap::new();
        for climb in climbs {
            grouped.entry(climb.session_id).or_default().push(climb);
        }
        Ok(grouped)
    }
}

const SESSION_COLUMNS: &str = "id, user_id, date, notes, created_at, updated_at";

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, notes))]
    async fn create_session(
        &self,
        user_id: i64,
        date: NaiveDate,
        notes: &str,
    ) -> Result<SessionModel, AppError> {
        debug!("Creating session in database");

        let query = format!(
            "INSERT INTO sessions (user_id, date, notes) VALUES ($1, $2, $3) RETURNING {}",
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, SessionModel>(&query)
            .bind(user_id)
            .bind(date)
            .bind(notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    warn!("Session already exists for this date");
                    AppError::Conflict(format!(
                        "Session on date {} already exists for user with id {}",
                        date, user_id
                    ))
                }
                e => {
                    warn!(error = %e, "Failed to create session in database");
                    AppError::DatabaseError(format!(
                        "Error creating session on date {} for user with id {}: {}",
                        date, user_id, e
                    ))
                }
            })
    }

    #[instrument(skip(self))]
    async fn find_all_sessions(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<SessionWithClimbs>, AppError> {
        let wrap = |e: sqlx::Error| {
            warn!(error = %e, "Failed to fetch sessions from database");
            AppError::DatabaseError(format!(
                "Error finding sessions for user with id {}: {}",
                user_id, e
            ))
        };

        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            SESSION_COLUMNS
        );
        let sessions = sqlx::query_as::<_, SessionModel>(&query)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(wrap)?;

        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let mut climbs = self.load_climbs(&ids).await.map_err(wrap)?;

        let result: Vec<SessionWithClimbs> = sessions
            .into_iter()
            .map(|session| SessionWithClimbs {
                climbs: climbs.remove(&session.id).unwrap_or_default(),
                session,
            })
            .collect();

        debug!(session_count = result.len(), "Sessions fetched from database");
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        user_id: i64,
        session_id: i64,
        climb_page: Page,
    ) -> Result<Option<SessionWithClimbs>, AppError> {
        let wrap = |e: sqlx::Error| {
            warn!(error = %e, "Failed to fetch session from database");
            AppError::DatabaseError(format!(
                "Error finding session with id {} for user with id {}: {}",
                session_id, user_id, e
            ))
        };

        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 AND id = $2",
            SESSION_COLUMNS
        );
        let session = sqlx::query_as::<_, SessionModel>(&query)
            .bind(user_id)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(wrap)?;

        let Some(session) = session else {
            debug!("Session not found in database");
            return Ok(None);
        };

        let climbs = sqlx::query_as::<_, ClimbModel>(
            "SELECT id, session_id, grade, attempts, sent, load, notes, created_at, updated_at \
             FROM climbs WHERE session_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(session.id)
        .bind(climb_page.limit)
        .bind(climb_page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(wrap)?;

        Ok(Some(SessionWithClimbs { session, climbs }))
    }

    #[instrument(skip(self))]
    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<SessionWithClimbs>, AppError> {
        let wrap = |e: sqlx::Error| {
            warn!(error = %e, "Failed to fetch session by date from database");
            AppError::DatabaseError(format!(
                "Error finding session on date {} for user with id {}: {}",
                date, user_id, e
            ))
        };

        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 AND date = $2",
            SESSION_COLUMNS
        );
        let session = sqlx::query_as::<_, SessionModel>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(wrap)?;

        let Some(session) = session else {
            return Ok(None);
        };

        let climbs = self
            .load_climbs(&[session.id])
            .await
            .map_err(wrap)?
            .remove(&session.id)
            .unwrap_or_default();

        Ok(Some(SessionWithClimbs { session, climbs }))
    }

    #[instrument(skip(self))]
    async fn find_session_summaries(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SessionSummary>, AppError> {
        sqlx::query_as::<_, SessionSummary>(
            "SELECT sessions.id, sessions.date, SUM(climbs.load) AS load \
             FROM sessions JOIN climbs ON climbs.session_id = sessions.id \
             WHERE sessions.user_id = $1 AND sessions.date BETWEEN $2 AND $3 \
             GROUP BY sessions.id, sessions.date \
             ORDER BY sessions.date ASC, sessions.id ASC",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch session summaries from database");
            AppError::DatabaseError(format!(
                "Error finding session summaries for user with id {}: {}",
                user_id, e
            ))
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::climb::models::NewClimb;
    use crate::climb::repository::{ClimbRepository, InMemoryClimbRepository};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub struct Fixture {
            pub sessions: InMemorySessionRepository,
            pub climbs: InMemoryClimbRepository,
        }

        pub fn fixture() -> Fixture {
            let store = Arc::new(InMemoryStore::new());
            Fixture {
                sessions: InMemorySessionRepository::new(store.clone()),
                climbs: InMemoryClimbRepository::new(store),
            }
        }

        pub async fn add_climb(fixture: &Fixture, session_id: i64, load: f64) -> ClimbModel {
            fixture
                .climbs
                .create_climb(&NewClimb {
                    session_id,
                    grade: "V4".to_string(),
                    attempts: 1,
                    sent: true,
                    load,
                    notes: String::new(),
                })
                .await
                .unwrap()
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_create_session_once_per_date() {
        let f = fixture();
        f.sessions
            .create_session(1, date(2024, 1, 1), "")
            .await
            .unwrap();

        let duplicate = f.sessions.create_session(1, date(2024, 1, 1), "").await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        // Another user may use the same date
        f.sessions
            .create_session(2, date(2024, 1, 1), "")
            .await
            .unwrap();
        assert_eq!(f.sessions.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_find_all_sessions_scoped_ordered_and_limited() {
        let f = fixture();
        for day in 1..=5 {
            f.sessions
                .create_session(1, date(2024, 1, day), "")
                .await
                .unwrap();
        }
        f.sessions
            .create_session(2, date(2024, 1, 1), "")
            .await
            .unwrap();

        let page = f
            .sessions
            .find_all_sessions(1, Page::new(0, 3).unwrap())
            .await
            .unwrap();

        assert_eq!(page.len(), 3);
        assert!(page.iter().all(|s| s.session.user_id == 1));
        // Newest first
        let dates: Vec<NaiveDate> = page.iter().map(|s| s.session.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 4), date(2024, 1, 3)]);

        let rest = f
            .sessions
            .find_all_sessions(1, Page::new(3, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_find_all_sessions_loads_all_climbs() {
        let f = fixture();
        let session = f
            .sessions
            .create_session(1, date(2024, 1, 1), "")
            .await
            .unwrap();
        for load in [1.0, 2.0, 3.0] {
            add_climb(&f, session.id, load).await;
        }

        let sessions = f
            .sessions
            .find_all_sessions(1, Page::default())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        let loads: Vec<f64> = sessions[0].climbs.iter().map(|c| c.load).collect();
        assert_eq!(loads, vec![3.0, 2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_find_by_id_paginates_climbs() {
        let f = fixture();
        let session = f
            .sessions
            .create_session(1, date(2024, 1, 1), "")
            .await
            .unwrap();
        for load in 1..=5 {
            add_climb(&f, session.id, load as f64).await;
        }

        let found = f
            .sessions
            .find_by_id(1, session.id, Page::new(1, 2).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.session.id, session.id);
        let loads: Vec<f64> = found.climbs.iter().map(|c| c.load).collect();
        assert_eq!(loads, vec![4.0, 3.0]);
    }

    #[tokio::test]
    async fn test_find_by_id_other_user_is_none() {
        let f = fixture();
        let session = f
            .sessions
            .create_session(1, date(2024, 1, 1), "")
            .await
            .unwrap();

        let found = f
            .sessions
            .find_by_id(2, session.id, Page::default())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_by_date() {
        let f = fixture();
        let session = f
            .sessions
            .create_session(1, date(2024, 3, 9), "comp prep")
            .await
            .unwrap();
        add_climb(&f, session.id, 5.0).await;

        let found = f
            .sessions
            .find_by_date(1, date(2024, 3, 9))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.session.notes, "comp prep");
        assert_eq!(found.climbs.len(), 1);

        assert!(f
            .sessions
            .find_by_date(1, date(2024, 3, 10))
            .await
            .unwrap()
            .is_none());
        assert!(f
            .sessions
            .find_by_date(2, date(2024, 3, 9))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_session_summaries_sum_loads_and_skip_empty_sessions() {
        let f = fixture();
        let with_climbs = f
            .sessions
            .create_session(1, date(2024, 1, 1), "")
            .await
            .unwrap();
        add_climb(&f, with_climbs.id, 10.0).await;
        add_climb(&f, with_climbs.id, 20.0).await;
        f.sessions
            .create_session(1, date(2024, 1, 5), "")
            .await
            .unwrap();

        let summaries = f
            .sessions
            .find_session_summaries(1, date(2024, 1, 1), date(2024, 1, 10))
            .await
            .unwrap();

        assert_eq!(
            summaries,
            vec![SessionSummary {
                id: with_climbs.id,
                date: date(2024, 1, 1),
                load: 30.0,
            }]
        );
    }

    #[tokio::test]
    async fn test_session_summaries_range_is_inclusive_and_scoped() {
        let f = fixture();
        for (user_id, day, load) in [(1, 1, 1.0), (1, 10, 2.0), (1, 11, 4.0), (2, 5, 8.0)] {
            let session = f
                .sessions
                .create_session(user_id, date(2024, 1, day), "")
                .await
                .unwrap();
            add_climb(&f, session.id, load).await;
        }

        let summaries = f
            .sessions
            .find_session_summaries(1, date(2024, 1, 1), date(2024, 1, 10))
            .await
            .unwrap();

        let by_date: Vec<(NaiveDate, f64)> = summaries.iter().map(|s| (s.date, s.load)).collect();
        assert_eq!(by_date, vec![(date(2024, 1, 1), 1.0), (date(2024, 1, 10), 2.0)]);
    }
}
