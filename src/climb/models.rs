use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the climbs table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ClimbModel {
    pub id: i64,
    pub session_id: i64,
    pub grade: String,
    pub attempts: i32,
    pub sent: bool,
    pub load: f64, // Effort metric summed into session summaries
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated climb ready to be inserted into a session
#[derive(Debug, Clone)]
pub struct NewClimb {
    pub session_id: i64,
    pub grade: String,
    pub attempts: i32,
    pub sent: bool,
    pub load: f64,
    pub notes: String,
}

impl ClimbModel {
    /// Newest first, ties broken by id so ordering is stable
    pub fn newest_first(a: &ClimbModel, b: &ClimbModel) -> std::cmp::Ordering {
        b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
    }
}
