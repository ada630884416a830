//! Configuration module
//!
//! Runtime configuration for the submission API, read from the environment
//! (and a `.env` file when present).

use std::env;
use std::time::Duration;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_MAX_FILESIZE_MB: u64 = 8;
const POST_MAX_SIZE_MB: u64 = 8;
const MEMORY_LIMIT_MB: u64 = 128;
const FILENAME_MAX_ATTEMPTS: u32 = 5;
const REQUEST_DEADLINE_SECS: u64 = 60;
const CSRF_TOKEN_TTL_SECS: u64 = 86_400;
const JWT_EXPIRY_HOURS: i64 = 24;

/// The three platform ceilings an upload has to fit under.
///
/// A value of `0` means "unlimited" for that ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    pub upload_max_filesize: u64,
    pub post_max_size: u64,
    pub memory_limit: u64,
}

impl UploadLimits {
    pub fn from_megabytes(upload_max_filesize: u64, post_max_size: u64, memory_limit: u64) -> Self {
        const MB: u64 = 1024 * 1024;
        Self {
            upload_max_filesize: upload_max_filesize * MB,
            post_max_size: post_max_size * MB,
            memory_limit: memory_limit * MB,
        }
    }

    /// Smallest non-zero ceiling, or `u64::MAX` when every ceiling is unlimited
    pub fn effective_max(&self) -> u64 {
        [self.upload_max_filesize, self.post_max_size, self.memory_limit]
            .into_iter()
            .filter(|limit| *limit > 0)
            .min()
            .unwrap_or(u64::MAX)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub csrf_secret: String,
    pub csrf_token_ttl_secs: u64,
    pub upload_limits: UploadLimits,
    pub filename_max_attempts: u32,
    pub request_deadline_secs: u64,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub public_base_url: String,
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let csrf_secret = env::var("CSRF_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        let upload_limits = UploadLimits::from_megabytes(
            parse_or("UPLOAD_MAX_FILESIZE_MB", UPLOAD_MAX_FILESIZE_MB),
            parse_or("POST_MAX_SIZE_MB", POST_MAX_SIZE_MB),
            parse_or("MEMORY_LIMIT_MB", MEMORY_LIMIT_MB),
        );

        let config = Config {
            environment,
            server_port: parse_or("SERVER_PORT", SERVER_PORT),
            cors_origins,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            jwt_expiry_hours: parse_or("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            csrf_secret,
            csrf_token_ttl_secs: parse_or("CSRF_TOKEN_TTL_SECS", CSRF_TOKEN_TTL_SECS),
            upload_limits,
            filename_max_attempts: parse_or("FILENAME_MAX_ATTEMPTS", FILENAME_MAX_ATTEMPTS),
            request_deadline_secs: parse_or("REQUEST_DEADLINE_SECS", REQUEST_DEADLINE_SECS),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/uploads".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.csrf_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "CSRF_SECRET must be at least 32 characters long"
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.filename_max_attempts == 0 {
            return Err(anyhow::anyhow!("FILENAME_MAX_ATTEMPTS must be at least 1"));
        }

        if self.request_deadline_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_DEADLINE_SECS must be at least 1"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            environment: "development".to_string(),
            server_port: 3000,
            cors_origins: vec!["*".to_string()],
            database_url: None,
            db_max_connections: 5,
            db_timeout_seconds: 5,
            jwt_secret: "a".repeat(32),
            jwt_expiry_hours: 1,
            csrf_secret: "b".repeat(32),
            csrf_token_ttl_secs: 60,
            upload_limits: UploadLimits::from_megabytes(8, 8, 128),
            filename_max_attempts: 5,
            request_deadline_secs: 60,
            local_storage_path: "/tmp/atelier".to_string(),
            local_storage_base_url: "http://localhost/uploads".to_string(),
            public_base_url: "http://localhost".to_string(),
        }
    }

    #[test]
    fn test_effective_max_is_smallest_ceiling() {
        let limits = UploadLimits::from_megabytes(8, 2, 128);
        assert_eq!(limits.effective_max(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_zero_ceiling_means_unlimited() {
        let limits = UploadLimits::from_megabytes(0, 16, 0);
        assert_eq!(limits.effective_max(), 16 * 1024 * 1024);
        assert_eq!(UploadLimits::from_megabytes(0, 0, 0).effective_max(), u64::MAX);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = test_config();
        assert!(config.validate().is_ok());
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wildcard_cors_in_production() {
        let mut config = test_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
        config.cors_origins = vec!["https://atelier.example".to_string()];
        assert!(config.validate().is_ok());
    }
}
