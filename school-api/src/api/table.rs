//! Raw record table overview (gated)
//!
//! Rows come back as positional JSON arrays in storage order, 100 per page.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use school_common::db::{self, TableInfo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, ValueRef};

use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct TableDataResponse {
    pub table_name: String,
    pub total_rows: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// GET /secure/tables
pub async fn list_record_tables(State(state): State<AppState>) -> ApiResult<Json<Vec<TableInfo>>> {
    Ok(Json(db::list_tables(&state.db).await?))
}

/// GET /secure/tables/:name?page=
pub async fn get_table_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> ApiResult<Json<TableDataResponse>> {
    let Query(query) = query?;

    // Only fixed table names ever reach the SQL text below
    if !db::is_record_table(&table_name) {
        return Err(ApiError::NotFound(format!("Table {}", table_name)));
    }

    let total_rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name))
        .fetch_one(&state.db)
        .await
        .map_err(school_common::Error::from)?;

    let pagination = calculate_pagination(total_rows, query.page);

    let rows = sqlx::query(&format!(
        "SELECT * FROM {} ORDER BY rowid LIMIT {} OFFSET {}",
        table_name, PAGE_SIZE, pagination.offset
    ))
    .fetch_all(&state.db)
    .await
    .map_err(school_common::Error::from)?;

    let columns = match rows.first() {
        Some(first) => first.columns().iter().map(|c| c.name().to_string()).collect(),
        None => table_columns(&state.db, &table_name).await?,
    };

    Ok(Json(TableDataResponse {
        table_name,
        total_rows,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        columns,
        rows: rows.iter().map(row_to_json).collect(),
    }))
}

fn row_to_json(row: &SqliteRow) -> Vec<Value> {
    (0..row.len())
        .map(|i| match row.try_get_raw(i) {
            Ok(raw) if raw.is_null() => Value::Null,
            Ok(_) => row
                .try_get::<String, _>(i)
                .map(Value::String)
                .or_else(|_| row.try_get::<i64, _>(i).map(|v| json!(v)))
                .or_else(|_| row.try_get::<f64, _>(i).map(|v| json!(v)))
                .unwrap_or(Value::Null),
            Err(_) => Value::Null,
        })
        .collect()
}

/// Column names of an empty table
async fn table_columns(pool: &SqlitePool, table_name: &str) -> ApiResult<Vec<String>> {
    // PRAGMA table_info: (cid, name, type, notnull, dflt_value, pk)
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
        .fetch_all(pool)
        .await
        .map_err(school_common::Error::from)?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>(1).ok())
        .collect())
}
