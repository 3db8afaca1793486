//! Course record operations

use crate::db::models::{Course, NewCourse};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

const SELECT_COURSES: &str = "SELECT course_id, course_name, instructor, created_at FROM courses";

const LOOKUP_CHUNK: usize = 500;

pub async fn list_courses(pool: &SqlitePool) -> Result<Vec<Course>> {
    let courses = sqlx::query_as::<_, Course>(&format!("{} ORDER BY rowid", SELECT_COURSES))
        .fetch_all(pool)
        .await?;
    Ok(courses)
}

pub async fn get_course(pool: &SqlitePool, course_id: &str) -> Result<Option<Course>> {
    let course = sqlx::query_as::<_, Course>(&format!("{} WHERE course_id = ?", SELECT_COURSES))
        .bind(course_id)
        .fetch_optional(pool)
        .await?;
    Ok(course)
}

/// First course whose name matches case-insensitively (insertion order)
pub async fn find_course_by_name(pool: &SqlitePool, course_name: &str) -> Result<Option<Course>> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "{} WHERE lower(course_name) = lower(?) ORDER BY rowid LIMIT 1",
        SELECT_COURSES
    ))
    .bind(course_name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(course)
}

/// Load every course whose identifier is in `ids`. Unknown ids are ignored.
pub async fn get_courses_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Course>> {
    let mut found = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(LOOKUP_CHUNK) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{} WHERE course_id IN (", SELECT_COURSES));
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        found.extend(query.build_query_as::<Course>().fetch_all(pool).await?);
    }

    Ok(found)
}

pub async fn insert_course(pool: &SqlitePool, new: NewCourse) -> Result<Course> {
    new.validate().map_err(Error::InvalidInput)?;
    let mut conn = pool.acquire().await?;
    insert_on(&mut conn, new).await
}

/// Insert all courses in one transaction. Any failure inserts nothing.
pub async fn insert_courses(pool: &SqlitePool, batch: Vec<NewCourse>) -> Result<Vec<String>> {
    for new in &batch {
        new.validate().map_err(Error::InvalidInput)?;
    }

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(batch.len());
    for new in batch {
        ids.push(insert_on(&mut tx, new).await?.course_id);
    }
    tx.commit().await?;

    Ok(ids)
}

async fn insert_on(conn: &mut SqliteConnection, new: NewCourse) -> Result<Course> {
    let course = Course {
        course_id: new
            .course_id
            .map(|id| id.trim().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        course_name: new.course_name,
        instructor: new.instructor,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO courses (course_id, course_name, instructor, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&course.course_id)
    .bind(&course.course_name)
    .bind(&course.instructor)
    .bind(course.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::from_insert(e, &format!("Course {}", course.course_id)))?;

    Ok(course)
}
