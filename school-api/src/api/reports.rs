//! Roster reports

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use school_common::db::Student;
use school_common::report::{self, CourseRoster, StudentCourse};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CourseNameQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /reports/students-not-enrolled
pub async fn students_not_enrolled(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(report::students_not_enrolled(&state.db).await?))
}

/// GET /reports/student-courses
pub async fn student_courses(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StudentCourse>>> {
    Ok(Json(report::student_courses(&state.db).await?))
}

/// GET /reports/students-by-course?name=
pub async fn students_by_course(
    State(state): State<AppState>,
    query: Result<Query<CourseNameQuery>, QueryRejection>,
) -> ApiResult<Json<CourseRoster>> {
    let Query(query) = query?;
    if query.name.trim().is_empty() {
        return Err(ApiError::bad_request(
            "VALIDATION_FAILED",
            "Query parameter 'name' is required",
        ));
    }
    Ok(Json(
        report::students_by_course_name(&state.db, &query.name).await?,
    ))
}
