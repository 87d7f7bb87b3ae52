use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{NewUser, UserModel},
    repository::UserRepository,
};
use crate::auth::{hash_password, verify_password, TokenConfig};
use crate::shared::AppError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Service for registration, login and password changes
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Validates the credentials and hashes the password
    #[instrument(skip(password))]
    pub async fn prepare_user(username: &str, password: &str) -> Result<NewUser, AppError> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        Ok(NewUser {
            username: username.to_string(),
            password_hash: hash_off_thread(password).await?,
        })
    }

    /// Persists a prepared user
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        let created = self.repository.create_user(user).await?;
        info!(user_id = created.id, "User registered");
        Ok(created)
    }

    /// Checks the credentials and issues a JWT on success
    #[instrument(skip(self, password))]
    pub async fn verify_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .repository
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown user");
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        if !verify_off_thread(password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.token_config.create_token(user.id, &user.username)?;
        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    /// Replaces the password after checking the current one.
    /// The stored hash is untouched unless the current password matches.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn update_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        if !verify_off_thread(current_password, &user.password_hash).await? {
            warn!(user_id, "Password update with wrong current password");
            return Err(AppError::Unauthorized(
                "Current password does not match".to_string(),
            ));
        }

        validate_password(new_password)?;
        let password_hash = hash_off_thread(new_password).await?;
        self.repository
            .update_password_hash(user_id, &password_hash)
            .await?;

        info!(user_id, "Password updated");
        Ok(())
    }
}

// Argon2 runs on the blocking pool
async fn hash_off_thread(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_off_thread(password: &str, hash: &str) -> Result<bool, AppError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "username must be between {} and {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
