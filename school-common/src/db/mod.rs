//! Record store: schema, models and queries

pub mod courses;
pub mod enrollments;
pub mod init;
pub mod models;
pub mod students;
pub mod tables;

pub use init::*;
pub use models::*;
pub use tables::*;
