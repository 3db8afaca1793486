//! Enrollment endpoints
//!
//! Responses embed the referenced student and course, or `null` when the
//! reference dangles.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use school_common::db::{self, NewEnrollment};
use school_common::join::{self, ResolvedEnrollment};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /enrollments
pub async fn list_enrollments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ResolvedEnrollment>>> {
    let enrollments = db::enrollments::list_enrollments(&state.db).await?;
    debug!("Resolving {} enrollments", enrollments.len());
    Ok(Json(join::resolve_enrollments(&state.db, enrollments).await?))
}

/// GET /enrollments/:id
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
) -> ApiResult<Json<ResolvedEnrollment>> {
    let id = Uuid::parse_str(&enrollment_id)
        .map_err(|_| ApiError::bad_request("INVALID_ID", "Invalid enrollment ID"))?;

    let enrollment = db::enrollments::get_enrollment(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Enrollment {}", enrollment_id)))?;

    Ok(Json(join::resolve_enrollment(&state.db, enrollment).await?))
}

/// POST /enrollments
///
/// References are not checked; reads resolve them to `null` if missing.
pub async fn create_enrollment(
    State(state): State<AppState>,
    body: Result<Json<NewEnrollment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResolvedEnrollment>)> {
    let Json(new) = body?;
    let enrollment = db::enrollments::insert_enrollment(&state.db, new).await?;
    info!(
        "Enrolled student {} in course {}",
        enrollment.student_id, enrollment.course_id
    );
    let resolved = join::resolve_enrollment(&state.db, enrollment).await?;
    Ok((StatusCode::CREATED, Json(resolved)))
}
