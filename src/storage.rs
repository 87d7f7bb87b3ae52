use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::{btree_map, BTreeMap};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::climb::models::ClimbModel;
use crate::session::models::SessionModel;
use crate::shared::AppError;
use crate::user::models::UserModel;

const MAX_CONNECTIONS: u32 = 10;

/// Connects to PostgreSQL and applies the embedded migrations
#[instrument(skip(database_url))]
pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to connect to database");
            AppError::DatabaseError(format!("Failed to connect to database: {}", e))
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to run database migrations");
            AppError::DatabaseError(format!("Failed to run database migrations: {}", e))
        })?;

    info!("Database connected and migrations applied");
    Ok(pool)
}

/// Rows keyed by a sequential id, mimicking a BIGSERIAL table
#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn insert(&mut self, id: i64, row: T) {
        self.rows.insert(id, row);
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn values(&self) -> btree_map::Values<'_, i64, T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// In-memory backing store for development and testing
///
/// All in-memory repositories share one store so that cross-table reads
/// (climbs of a session, sessions of a user) see the same data. Data is
/// lost when the application restarts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub users: RwLock<Table<UserModel>>,
    pub sessions: RwLock<Table<SessionModel>>,
    pub climbs: RwLock<Table<ClimbModel>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ids_are_sequential() {
        let mut table: Table<&str> = Table::default();
        let first = table.next_id();
        table.insert(first, "a");
        let second = table.next_id();
        table.insert(second, "b");

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(2), Some(&"b"));
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_empty_table() {
        let table: Table<u8> = Table::default();
        assert!(table.is_empty());
        assert_eq!(table.values().count(), 0);
    }

    #[tokio::test]
    async fn test_find_through_guard() {
        let table: RwLock<Table<&str>> = RwLock::new(Table::default());
        {
            let mut rows = table.write().await;
            let id = rows.next_id();
            rows.insert(id, "crimp");
        }

        let found = {
            let rows = table.read().await;
            rows.values().find(|row| row.starts_with('c')).cloned()
        };
        assert_eq!(found, Some("crimp"));
    }
}
