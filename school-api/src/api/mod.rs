//! HTTP API handlers for school-api

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod reports;
pub mod stats;
pub mod students;
pub mod table;
pub mod upload;

pub use auth::api_key_middleware;
pub use courses::{create_course, list_courses, students_in_course};
pub use enrollments::{create_enrollment, get_enrollment, list_enrollments};
pub use health::health_routes;
pub use reports::{student_courses, students_by_course, students_not_enrolled};
pub use stats::{grade_stats, top_courses};
pub use students::{
    create_student, delete_student, get_student, list_students, search_students, update_student,
};
pub use table::{get_table_data, list_record_tables};
pub use upload::{upload_csv, upload_info};
