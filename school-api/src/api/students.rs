//! Student endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use school_common::db::{self, NewStudent, Student, StudentUpdate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for GET /students/search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /students
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<Vec<Student>>> {
    let students = db::students::list_students(&state.db).await?;
    debug!("Listed {} students", students.len());
    Ok(Json(students))
}

/// GET /students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<Student>> {
    db::students::get_student(&state.db, &student_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Student {}", student_id)))
}

/// POST /students
pub async fn create_student(
    State(state): State<AppState>,
    body: Result<Json<NewStudent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let Json(new) = body?;
    let student = db::students::insert_student(&state.db, new).await?;
    info!("Created student {}", student.student_id);
    Ok((StatusCode::CREATED, Json(student)))
}

/// PUT /students/:id
///
/// Only the supplied fields change.
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    body: Result<Json<StudentUpdate>, JsonRejection>,
) -> ApiResult<Json<Student>> {
    let Json(update) = body?;
    let student = db::students::update_student(&state.db, &student_id, update).await?;
    info!("Updated student {}", student_id);
    Ok(Json(student))
}

/// DELETE /students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let student = db::students::delete_student(&state.db, &student_id).await?;
    info!("Deleted student {}", student.student_id);
    Ok(Json(json!({
        "message": "Student deleted",
        "student": student,
    })))
}

/// GET /students/search?name=
pub async fn search_students(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Student>>> {
    let Query(query) = query?;
    if query.name.trim().is_empty() {
        return Err(ApiError::bad_request(
            "VALIDATION_FAILED",
            "Query parameter 'name' is required",
        ));
    }
    let students = db::students::search_students(&state.db, &query.name).await?;
    Ok(Json(students))
}
