//! CSV bulk import of students

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use school_common::import;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the CSV file
pub const FILE_FIELD: &str = "file";

/// GET /upload-csv
pub async fn upload_info() -> Json<Value> {
    Json(json!({
        "message": "POST a multipart form with a CSV file in the 'file' field",
        "required_columns": ["name", "age", "grade", "email"],
        "optional_columns": ["student_id"],
    }))
}

/// POST /upload-csv
///
/// All rows are inserted or none are.
pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request("INVALID_UPLOAD", e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(upload_error)?;

        let summary = import::import_students(&state.db, filename.as_deref(), &bytes).await?;
        info!(
            "Imported {} students from {}",
            summary.inserted,
            filename.as_deref().unwrap_or("<unnamed>")
        );

        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Students imported successfully",
                "inserted": summary.inserted,
                "ids": summary.ids,
            })),
        ));
    }

    Err(ApiError::bad_request(
        "INVALID_UPLOAD",
        format!("Multipart field '{}' is required", FILE_FIELD),
    ))
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(err.body_text())
    } else {
        ApiError::bad_request("INVALID_UPLOAD", err.body_text())
    }
}
