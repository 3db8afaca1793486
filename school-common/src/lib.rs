//! # School Records Common Library
//!
//! Shared code for the school records service and its tools:
//! - Record store schema, models and queries
//! - CSV import pipeline
//! - Enrollment join resolver
//! - Aggregation and roster reports
//! - API key handling
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod join;
pub mod report;

pub use error::{Error, ImportError, Result};
