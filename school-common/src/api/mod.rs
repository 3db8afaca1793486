//! Framework-independent pieces of the HTTP API
//!
//! Each service wraps these with axum middleware and handlers.

pub mod auth;

pub use auth::{
    generate_api_key, resolve_api_key, validate_api_key, ApiAuthError, ApiKeySource,
    API_KEY_HEADER,
};
