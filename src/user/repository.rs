use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::shared::AppError;
use crate::storage::InMemoryStore;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError>;
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserModel>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn update_password_hash(&self, user_id: i64, password_hash: &str)
        -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    /// Returns the current number of users in the repository
    pub async fn user_count(&self) -> usize {
        self.store.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(username = %user.username, "Creating user in memory");

        let mut users = self.store.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            warn!(username = %user.username, "Username already taken in memory");
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }

        let now = Utc::now();
        let id = users.next_id();
        let model = UserModel {
            id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, model.clone());

        debug!(user_id = id, "User created successfully in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserModel>, AppError> {
        Ok(self.store.users.read().await.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.store.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut users = self.store.users.write().await;
        let user = users.get_mut(user_id).ok_or_else(|| {
            warn!(user_id, "User not found for password update in memory");
            AppError::NotFound(format!("User with id {} not found", user_id))
        })?;

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();

        debug!(user_id, "Password hash updated in memory");
        Ok(())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(username = %user.username, "Creating user in database");

        let query = format!(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserModel>(&query)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    warn!(username = %user.username, "Username already taken");
                    AppError::Conflict(format!("Username {} is already taken", user.username))
                }
                e => {
                    warn!(error = %e, username = %user.username, "Failed to create user in database");
                    AppError::DatabaseError(format!(
                        "Error creating user {}: {}",
                        user.username, e
                    ))
                }
            })
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserModel>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserModel>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id, "Failed to fetch user from database");
                AppError::DatabaseError(format!("Error finding user with id {}: {}", user_id, e))
            })
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserModel>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, username = %username, "Failed to fetch user from database");
                AppError::DatabaseError(format!("Error finding user {}: {}", username, e))
            })
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, user_id, "Failed to update password in database");
                    AppError::DatabaseError(format!(
                        "Error updating password for user with id {}: {}",
                        user_id, e
                    ))
                })?;

        if result.rows_affected() == 0 {
            warn!(user_id, "User not found for password update");
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        debug!(user_id, "Password hash updated in database");
        Ok(())
    }
}
