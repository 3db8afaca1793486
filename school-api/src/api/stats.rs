//! Aggregate statistics

use axum::{extract::State, Json};
use school_common::report::{self, GradeCount, TopCourse};

use crate::error::ApiResult;
use crate::AppState;

/// GET /stats/grades
pub async fn grade_stats(State(state): State<AppState>) -> ApiResult<Json<Vec<GradeCount>>> {
    Ok(Json(report::grade_distribution(&state.db).await?))
}

/// GET /stats/top-courses
///
/// Sorted by enrollment count, highest first. Empty when nothing is enrolled.
pub async fn top_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<TopCourse>>> {
    Ok(Json(report::top_courses(&state.db).await?))
}
