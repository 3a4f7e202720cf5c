/// Configuration for the API server, loaded from environment variables.
///
/// # Environment Variables
///
/// - `API_HOST`: bind host (default: 0.0.0.0)
/// - `API_PORT`: bind port (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `ACCESS_TOKEN_SECRET`: HS256 secret for access tokens (required, >= 32 chars)
/// - `REFRESH_TOKEN_SECRET`: HS256 secret for refresh tokens (required, >= 32 chars)
/// - `ACCESS_TOKEN_TTL_HOURS`: access-token lifetime (default: 24)
/// - `REFRESH_TOKEN_TTL_DAYS`: refresh-token lifetime (default: 10)
/// - `PUBLIC_BASE_URL`: base for links embedded in emails (default: http://localhost:8080)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for permissive (default: *)
/// - `MAIL_API_URL` / `MAIL_API_TOKEN` / `MAIL_SENDER`: HTTP mail API; when
///   unset, outgoing mail is logged and dropped
/// - `RUST_LOG`: log filter (default: info)

use chrono::Duration;
use std::env;
use taskcamp_shared::auth::session::TokenSettings;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    pub mail: Option<MailConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Session-token configuration.
///
/// The two secrets must differ; a shared secret would let a refresh token
/// double as an access token at the signature level.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_hours: i64,
    pub refresh_ttl_days: i64,
    pub public_base_url: String,
}

/// HTTP mail API configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_token: String,
    pub sender: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))
}

fn secret(name: &str) -> anyhow::Result<String> {
    let value = required(name)?;
    if value.len() < 32 {
        anyhow::bail!("{name} must be at least 32 characters long");
    }
    Ok(value)
}

impl Config {
    /// Loads configuration from the environment (and `.env` in development).
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing, a numeric
    /// variable fails to parse, or the two token secrets are equal.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = required("DATABASE_URL")?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let access_secret = secret("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = secret("REFRESH_TOKEN_SECRET")?;
        if access_secret == refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let access_ttl_hours = env::var("ACCESS_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;
        let refresh_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<i64>()?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        // All three mail variables or none
        let mail = match (
            env::var("MAIL_API_URL"),
            env::var("MAIL_API_TOKEN"),
            env::var("MAIL_SENDER"),
        ) {
            (Ok(api_url), Ok(api_token), Ok(sender)) => Some(MailConfig {
                api_url,
                api_token,
                sender,
            }),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            tokens: TokenConfig {
                access_secret,
                refresh_secret,
                access_ttl_hours,
                refresh_ttl_days,
                public_base_url,
            },
            mail,
        })
    }

    /// Returns the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session-token settings for the session manager.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.tokens.access_secret.clone(),
            refresh_secret: self.tokens.refresh_secret.clone(),
            access_ttl: Duration::hours(self.tokens.access_ttl_hours),
            refresh_ttl: Duration::days(self.tokens.refresh_ttl_days),
            public_base_url: self.tokens.public_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            tokens: TokenConfig {
                access_secret: "access-secret-0123456789abcdef!!".to_string(),
                refresh_secret: "refresh-secret-0123456789abcdef!".to_string(),
                access_ttl_hours: 24,
                refresh_ttl_days: 10,
                public_base_url: "http://localhost:8080".to_string(),
            },
            mail: None,
        }
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn token_settings_carry_both_secrets() {
        let settings = test_config().token_settings();
        assert_ne!(settings.access_secret, settings.refresh_secret);
        assert_eq!(settings.access_ttl, Duration::hours(24));
        assert_eq!(settings.refresh_ttl, Duration::days(10));
    }
}
