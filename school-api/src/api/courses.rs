//! Course endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use school_common::db::{self, Course, NewCourse, Student};
use school_common::report;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// GET /courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(db::courses::list_courses(&state.db).await?))
}

/// POST /courses
pub async fn create_course(
    State(state): State<AppState>,
    body: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let Json(new) = body?;
    let course = db::courses::insert_course(&state.db, new).await?;
    info!("Created course {} ({})", course.course_id, course.course_name);
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /courses/:id/students
pub async fn students_in_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(report::students_in_course(&state.db, &course_id).await?))
}
