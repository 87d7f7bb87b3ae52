use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::climb::models::ClimbModel;

/// Database model for the sessions table.
/// At most one session exists per (user_id, date).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SessionModel {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionModel {
    /// Newest first, ties broken by id so ordering is stable
    pub fn newest_first(a: &SessionModel, b: &SessionModel) -> std::cmp::Ordering {
        b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
    }
}

/// A session with its climbs loaded, newest climb first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithClimbs {
    #[serde(flatten)]
    pub session: SessionModel,
    pub climbs: Vec<ClimbModel>,
}

/// Summed climb load of one session. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: i64,
    pub date: NaiveDate,
    pub load: f64,
}
