use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument, warn};

use super::types::UserClaims;
use crate::config::AppConfig;
use crate::shared::AppError;

/// Signing secret and lifetime for login tokens
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_hours: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.token_expiration_hours)
    }

    /// When a token issued at `issued_at` stops being accepted
    fn expires_at(&self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        TimeDelta::try_hours(self.expiration_hours)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                warn!(
                    expiration_hours = self.expiration_hours,
                    "Token lifetime out of range"
                );
                AppError::JwtError(format!(
                    "token lifetime of {} hours is out of range",
                    self.expiration_hours
                ))
            })
    }

    /// Issues a signed HS256 login token for the user
    #[instrument(skip(self, username))]
    pub fn create_token(&self, user_id: i64, username: &str) -> Result<String, AppError> {
        let issued_at = Utc::now();
        let expires_at = self.expires_at(issued_at)?;

        let claims = UserClaims {
            user_id,
            username: username.to_string(),
            exp: expires_at.timestamp().max(0) as usize,
            iat: issued_at.timestamp().max(0) as usize,
        };
        debug!(exp = claims.exp, "Issuing login token");

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::JwtError(format!("Failed to sign token for user {}: {}", user_id, e)))
    }

    /// Checks signature and expiry, returning the claims of a live token
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<UserClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let claims = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::JwtError(format!("Rejected token: {}", e)))?
        .claims;

        debug!(user_id = claims.user_id, "Token accepted");
        Ok(claims)
    }
}
