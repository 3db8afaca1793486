//! Student record operations

use crate::db::models::{NewStudent, Student, StudentUpdate};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

const SELECT_STUDENTS: &str =
    "SELECT student_id, name, age, grade, email, created_at FROM students";

/// Rows per multi-key lookup, kept well under SQLite's bound-parameter limit
const LOOKUP_CHUNK: usize = 500;

/// List all students in insertion order
pub async fn list_students(pool: &SqlitePool) -> Result<Vec<Student>> {
    let students = sqlx::query_as::<_, Student>(&format!("{} ORDER BY rowid", SELECT_STUDENTS))
        .fetch_all(pool)
        .await?;
    Ok(students)
}

/// Load one student by exact identifier match
pub async fn get_student(pool: &SqlitePool, student_id: &str) -> Result<Option<Student>> {
    let student =
        sqlx::query_as::<_, Student>(&format!("{} WHERE student_id = ?", SELECT_STUDENTS))
            .bind(student_id)
            .fetch_optional(pool)
            .await?;
    Ok(student)
}

/// Load every student whose identifier is in `ids`. Unknown ids are ignored.
pub async fn get_students_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Student>> {
    let mut found = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(LOOKUP_CHUNK) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{} WHERE student_id IN (", SELECT_STUDENTS));
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        found.extend(query.build_query_as::<Student>().fetch_all(pool).await?);
    }

    Ok(found)
}

/// Insert one student, assigning an identifier when none was supplied
pub async fn insert_student(pool: &SqlitePool, new: NewStudent) -> Result<Student> {
    new.validate().map_err(Error::InvalidInput)?;
    let mut conn = pool.acquire().await?;
    insert_on(&mut conn, new).await
}

/// Insert all students in one transaction. Any failure inserts nothing.
///
/// Returns the identifiers in input order.
pub async fn insert_students(pool: &SqlitePool, batch: Vec<NewStudent>) -> Result<Vec<String>> {
    for new in &batch {
        new.validate().map_err(Error::InvalidInput)?;
    }

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(batch.len());
    for new in batch {
        ids.push(insert_on(&mut tx, new).await?.student_id);
    }
    tx.commit().await?;

    debug!("Inserted {} students", ids.len());
    Ok(ids)
}

async fn insert_on(conn: &mut SqliteConnection, new: NewStudent) -> Result<Student> {
    let student = Student {
        student_id: new
            .student_id
            .map(|id| id.trim().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: new.name,
        age: new.age,
        grade: new.grade,
        email: new.email,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO students (student_id, name, age, grade, email, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&student.student_id)
    .bind(&student.name)
    .bind(student.age)
    .bind(&student.grade)
    .bind(&student.email)
    .bind(student.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::from_insert(e, &format!("Student {}", student.student_id)))?;

    Ok(student)
}

/// Apply a partial update and return the updated record
pub async fn update_student(
    pool: &SqlitePool,
    student_id: &str,
    update: StudentUpdate,
) -> Result<Student> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No fields provided for update".to_string()));
    }
    update.validate().map_err(Error::InvalidInput)?;

    let result = sqlx::query(
        r#"
        UPDATE students
        SET name = COALESCE(?, name),
            age = COALESCE(?, age),
            grade = COALESCE(?, grade),
            email = COALESCE(?, email)
        WHERE student_id = ?
        "#,
    )
    .bind(update.name)
    .bind(update.age)
    .bind(update.grade)
    .bind(update.email)
    .bind(student_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Student {}", student_id)));
    }

    get_student(pool, student_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Student {}", student_id)))
}

/// Delete a student unless an enrollment still references it.
///
/// Returns the deleted record.
pub async fn delete_student(pool: &SqlitePool, student_id: &str) -> Result<Student> {
    let student = get_student(pool, student_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Student {}", student_id)))?;

    let references: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE student_id = ?")
            .bind(student_id)
            .fetch_one(pool)
            .await?;

    if references > 0 {
        return Err(Error::StudentEnrolled(student_id.to_string()));
    }

    sqlx::query("DELETE FROM students WHERE student_id = ?")
        .bind(student_id)
        .execute(pool)
        .await?;

    Ok(student)
}

/// Case-insensitive substring match on name
pub async fn search_students(pool: &SqlitePool, name: &str) -> Result<Vec<Student>> {
    let needle = name.trim();
    if needle.is_empty() {
        return Err(Error::InvalidInput("name must not be blank".to_string()));
    }

    // lower() folds ASCII only, matching SQLite's built-in case rules
    let students = sqlx::query_as::<_, Student>(&format!(
        "{} WHERE instr(lower(name), lower(?)) > 0 ORDER BY rowid",
        SELECT_STUDENTS
    ))
    .bind(needle)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::open_in_memory;

    fn new_student(id: Option<&str>, name: &str, grade: &str) -> NewStudent {
        NewStudent {
            student_id: id.map(str::to_string),
            name: name.to_string(),
            age: 21,
            grade: grade.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_student() {
        let pool = open_in_memory().await.unwrap();

        let created = insert_student(&pool, new_student(Some("s1"), "Ravi", "A"))
            .await
            .unwrap();
        assert_eq!(created.student_id, "s1");

        let loaded = get_student(&pool, "s1").await.unwrap().expect("student exists");
        assert_eq!(loaded.name, "Ravi");
        assert_eq!(loaded.age, 21);
        assert_eq!(loaded.grade, "A");
        assert_eq!(loaded.email, "ravi@example.com");
    }

    #[tokio::test]
    async fn test_generated_identifier_is_uuid() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_student(&pool, new_student(None, "Meena", "B")).await.unwrap();
        assert!(Uuid::parse_str(&created.student_id).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_identifier_conflicts() {
        let pool = open_in_memory().await.unwrap();
        insert_student(&pool, new_student(Some("s1"), "Ravi", "A")).await.unwrap();

        let err = insert_student(&pool, new_student(Some("s1"), "Other", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_bulk_insert_is_all_or_nothing() {
        let pool = open_in_memory().await.unwrap();
        let batch = vec![
            new_student(Some("a"), "Anu", "A"),
            new_student(Some("b"), "Bala", "B"),
            new_student(Some("a"), "Again", "C"),
        ];

        assert!(insert_students(&pool, batch).await.is_err());
        assert!(list_students(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let pool = open_in_memory().await.unwrap();
        let before = insert_student(&pool, new_student(Some("s1"), "Ravi", "B"))
            .await
            .unwrap();

        let after = update_student(
            &pool,
            "s1",
            StudentUpdate {
                grade: Some("A".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(after.grade, "A");
        assert_eq!(after.name, before.name);
        assert_eq!(after.age, before.age);
        assert_eq!(after.email, before.email);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let pool = open_in_memory().await.unwrap();

        let empty = update_student(&pool, "s1", StudentUpdate::default()).await;
        assert!(matches!(empty, Err(Error::InvalidInput(_))));

        let missing = update_student(
            &pool,
            "nope",
            StudentUpdate {
                age: Some(30),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_enrollment() {
        let pool = open_in_memory().await.unwrap();
        insert_student(&pool, new_student(Some("s1"), "Ravi", "A")).await.unwrap();
        sqlx::query(
            "INSERT INTO enrollments (enrollment_id, student_id, course_id, created_at) VALUES ('e1', 's1', 'c1', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = delete_student(&pool, "s1").await.unwrap_err();
        assert!(matches!(err, Error::StudentEnrolled(_)));
        assert!(get_student(&pool, "s1").await.unwrap().is_some());

        sqlx::query("DELETE FROM enrollments").execute(&pool).await.unwrap();
        let deleted = delete_student(&pool, "s1").await.unwrap();
        assert_eq!(deleted.student_id, "s1");
        assert!(get_student(&pool, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let pool = open_in_memory().await.unwrap();
        insert_student(&pool, new_student(Some("1"), "Priya Raman", "A")).await.unwrap();
        insert_student(&pool, new_student(Some("2"), "Karthik", "B")).await.unwrap();
        insert_student(&pool, new_student(Some("3"), "RAMYA", "C")).await.unwrap();

        let hits = search_students(&pool, "ram").await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        assert!(matches!(
            search_students(&pool, "  ").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_ids_ignores_unknown() {
        let pool = open_in_memory().await.unwrap();
        insert_student(&pool, new_student(Some("1"), "Anu", "A")).await.unwrap();

        let found = get_students_by_ids(&pool, &["1".to_string(), "zz".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(get_students_by_ids(&pool, &[]).await.unwrap().is_empty());
    }
}
