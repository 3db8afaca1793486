//! school-api library - HTTP service over the school record store
//!
//! Routes are split into public read routes, write routes and the `/secure`
//! tree, which repeats the read routes behind the `x-api-key` gate.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod error;
pub mod pagination;

pub use error::{ApiError, ApiResult};

/// Default upper bound for CSV upload bodies
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store connection pool
    pub db: SqlitePool,
    /// Shared secret for `/secure` routes
    pub api_key: Arc<str>,
    /// Body limit for `/upload-csv`
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            api_key: api_key.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Read-only routes, mounted both at the root and under `/secure`
fn read_routes() -> Router<AppState> {
    use axum::routing::get;

    Router::new()
        .route("/students", get(api::list_students))
        .route("/students/search", get(api::search_students))
        .route("/students/:id", get(api::get_student))
        .route("/courses", get(api::list_courses))
        .route("/courses/:id/students", get(api::students_in_course))
        .route("/enrollments", get(api::list_enrollments))
        .route("/enrollments/:id", get(api::get_enrollment))
        .route("/stats/grades", get(api::grade_stats))
        .route("/stats/top-courses", get(api::top_courses))
        .route("/reports/students-not-enrolled", get(api::students_not_enrolled))
        .route("/reports/student-courses", get(api::student_courses))
        .route("/reports/students-by-course", get(api::students_by_course))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Gated routes: everything readable plus the table overview
    let secure = read_routes()
        .route("/tables", get(api::list_record_tables))
        .route("/tables/:name", get(api::get_table_data))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::api_key_middleware,
        ));

    let writes = Router::new()
        .route("/students", post(api::create_student))
        .route(
            "/students/:id",
            put(api::update_student).delete(api::delete_student),
        )
        .route("/courses", post(api::create_course))
        .route("/enrollments", post(api::create_enrollment))
        .route(
            "/upload-csv",
            get(api::upload_info)
                .post(api::upload_csv)
                .layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        );

    Router::new()
        .merge(read_routes())
        .merge(writes)
        .merge(api::health_routes())
        .nest("/secure", secure)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
