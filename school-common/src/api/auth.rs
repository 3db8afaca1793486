//! Shared-secret API key handling
//!
//! Guarded routes require an `x-api-key` header equal to a single configured
//! secret. When no secret is configured the service keeps one in the
//! `settings` table, generating it on first start.
//!
//! This module contains ONLY pure functions and database operations.
//! The axum middleware lives in the service crate.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::SqlitePool;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Settings key under which a generated secret is stored
pub const API_KEY_SETTING: &str = "api_key";

/// Length of generated secrets
pub const GENERATED_KEY_LEN: usize = 32;

/// Where the effective API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Configured,
    Stored,
    Generated,
}

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Header absent
    MissingKey,
    /// Header present but not equal to the secret
    InvalidKey,
    /// Database error loading or storing the secret
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingKey => write!(f, "Missing API key"),
            ApiAuthError::InvalidKey => write!(f, "Invalid API key"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Check a presented header value against the secret
pub fn validate_api_key(provided: Option<&str>, expected: &str) -> Result<(), ApiAuthError> {
    match provided {
        None => Err(ApiAuthError::MissingKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(ApiAuthError::InvalidKey),
    }
}

/// Generate a random alphanumeric secret
pub fn generate_api_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_KEY_LEN)
        .map(char::from)
        .collect()
}

/// Resolve the effective API key.
///
/// A configured key wins. Otherwise the stored key is used, and if none is
/// stored a new one is generated and persisted.
pub async fn resolve_api_key(
    db: &SqlitePool,
    configured: Option<&str>,
) -> Result<(String, ApiKeySource), ApiAuthError> {
    if let Some(key) = configured {
        return Ok((key.to_string(), ApiKeySource::Configured));
    }

    let stored: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(API_KEY_SETTING)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    if let Some((Some(value),)) = stored {
        if !value.trim().is_empty() {
            return Ok((value, ApiKeySource::Stored));
        }
    }

    let key = generate_api_key();
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(API_KEY_SETTING)
        .bind(&key)
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok((key, ApiKeySource::Generated))
}
