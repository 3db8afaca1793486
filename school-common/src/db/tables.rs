//! Record table listing and row counts

use crate::db::init::RECORD_TABLES;
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Table metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Number of rows in table
    pub row_count: i64,
}

/// True when `name` is one of the record tables exposed for inspection
pub fn is_record_table(name: &str) -> bool {
    RECORD_TABLES.contains(&name)
}

/// List the record tables with row counts
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableInfo>> {
    let mut table_infos = Vec::with_capacity(RECORD_TABLES.len());

    for table_name in RECORD_TABLES {
        // Names come from the fixed list above, never from the request
        let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name))
            .fetch_one(pool)
            .await?;

        table_infos.push(TableInfo {
            name: table_name.to_string(),
            row_count,
        });
    }

    Ok(table_infos)
}
