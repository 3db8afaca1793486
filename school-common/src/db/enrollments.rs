//! Enrollment record operations
//!
//! Enrollments are insert-only and may reference students or courses that
//! do not exist.

use crate::db::models::{Enrollment, NewEnrollment};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const SELECT_ENROLLMENTS: &str =
    "SELECT enrollment_id, student_id, course_id, created_at FROM enrollments";

pub async fn list_enrollments(pool: &SqlitePool) -> Result<Vec<Enrollment>> {
    let enrollments =
        sqlx::query_as::<_, Enrollment>(&format!("{} ORDER BY rowid", SELECT_ENROLLMENTS))
            .fetch_all(pool)
            .await?;
    Ok(enrollments)
}

pub async fn get_enrollment(pool: &SqlitePool, enrollment_id: Uuid) -> Result<Option<Enrollment>> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "{} WHERE enrollment_id = ?",
        SELECT_ENROLLMENTS
    ))
    .bind(enrollment_id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(enrollment)
}

pub async fn list_enrollments_for_course(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<Enrollment>> {
    let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
        "{} WHERE course_id = ? ORDER BY rowid",
        SELECT_ENROLLMENTS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(enrollments)
}

pub async fn insert_enrollment(pool: &SqlitePool, new: NewEnrollment) -> Result<Enrollment> {
    new.validate().map_err(Error::InvalidInput)?;
    let mut conn = pool.acquire().await?;
    insert_on(&mut conn, new).await
}

/// Insert all enrollments in one transaction. Any failure inserts nothing.
pub async fn insert_enrollments(
    pool: &SqlitePool,
    batch: Vec<NewEnrollment>,
) -> Result<Vec<String>> {
    for new in &batch {
        new.validate().map_err(Error::InvalidInput)?;
    }

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(batch.len());
    for new in batch {
        ids.push(insert_on(&mut tx, new).await?.enrollment_id);
    }
    tx.commit().await?;

    Ok(ids)
}

async fn insert_on(conn: &mut SqliteConnection, new: NewEnrollment) -> Result<Enrollment> {
    let enrollment = Enrollment {
        enrollment_id: Uuid::new_v4().to_string(),
        student_id: new.student_id.trim().to_string(),
        course_id: new.course_id.trim().to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO enrollments (enrollment_id, student_id, course_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&enrollment.enrollment_id)
    .bind(&enrollment.student_id)
    .bind(&enrollment.course_id)
    .bind(enrollment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(enrollment)
}
