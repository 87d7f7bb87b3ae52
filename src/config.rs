use std::net::SocketAddr;
use thiserror::Error;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_TOKEN_EXPIRATION_HOURS: i64 = 72;
pub const MAX_TOKEN_EXPIRATION_HOURS: i64 = 24 * 365;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
}

/// Runtime configuration read from the environment
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_expiration_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidEnvValue {
                var: "BIND_ADDR".to_string(),
                reason: e.to_string(),
            })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, using the development default");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let token_expiration_hours = match lookup("TOKEN_EXPIRATION_HOURS") {
            Some(raw) => {
                let hours: i64 = raw.parse().map_err(|_| ConfigError::InvalidEnvValue {
                    var: "TOKEN_EXPIRATION_HOURS".to_string(),
                    reason: format!("expected an integer, got {:?}", raw),
                })?;
                if !(1..=MAX_TOKEN_EXPIRATION_HOURS).contains(&hours) {
                    return Err(ConfigError::InvalidEnvValue {
                        var: "TOKEN_EXPIRATION_HOURS".to_string(),
                        reason: format!("must be between 1 and {}", MAX_TOKEN_EXPIRATION_HOURS),
                    });
                }
                hours
            }
            None => DEFAULT_TOKEN_EXPIRATION_HOURS,
        };

        Ok(Self {
            bind_addr,
            database_url,
            jwt_secret,
            token_expiration_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.token_expiration_hours, DEFAULT_TOKEN_EXPIRATION_HOURS);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("DATABASE_URL", "postgres://localhost/vertilog"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_EXPIRATION_HOURS", "12"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/vertilog")
        );
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.token_expiration_hours, 12);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("BIND_ADDR", "not-an-addr")]).is_err());
        assert!(config_from(&[("TOKEN_EXPIRATION_HOURS", "soon")]).is_err());
        assert!(config_from(&[("TOKEN_EXPIRATION_HOURS", "0")]).is_err());
    }

    #[test]
    fn test_token_expiration_upper_bound() {
        let year = MAX_TOKEN_EXPIRATION_HOURS.to_string();
        let config = config_from(&[("TOKEN_EXPIRATION_HOURS", year.as_str())]).unwrap();
        assert_eq!(config.token_expiration_hours, MAX_TOKEN_EXPIRATION_HOURS);

        assert!(matches!(
            config_from(&[("TOKEN_EXPIRATION_HOURS", "100000000000")]),
            Err(ConfigError::InvalidEnvValue { .. })
        ));
    }
}
