//! Aggregation and roster reports
//!
//! Group-by counts and join-based rosters over the record store. Reports are
//! best-effort: enrollments pointing at missing students or courses are
//! skipped rather than treated as errors.

use crate::db::models::{Course, Student};
use crate::db::{courses, enrollments};
use crate::join::{load_index, JoinIndex};
use crate::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GradeCount {
    pub grade: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCourse {
    pub course_id: String,
    pub course_name: String,
    pub instructor: String,
    pub enroll_count: i64,
}

/// One row of the student/course inner join
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCourse {
    pub student_id: String,
    pub name: String,
    pub course_id: String,
    pub course_name: String,
    pub instructor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub name: String,
    pub grade: String,
}

/// Students enrolled in one course, looked up by course name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRoster {
    pub course_id: String,
    pub course_name: String,
    pub students: Vec<RosterEntry>,
}

/// Number of students per grade, ordered by grade
pub async fn grade_distribution(pool: &SqlitePool) -> Result<Vec<GradeCount>> {
    let counts = sqlx::query_as::<_, GradeCount>(
        "SELECT grade, COUNT(*) AS count FROM students GROUP BY grade ORDER BY grade",
    )
    .fetch_all(pool)
    .await?;
    Ok(counts)
}

/// Enrollment counts per course, highest first
pub async fn top_courses(pool: &SqlitePool) -> Result<Vec<TopCourse>> {
    let counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT course_id, COUNT(*) FROM enrollments GROUP BY course_id")
            .fetch_all(pool)
            .await?;

    let course_ids: Vec<String> = counts.iter().map(|(id, _)| id.clone()).collect();
    let index = JoinIndex::new(vec![], courses::get_courses_by_ids(pool, &course_ids).await?);

    Ok(rank_courses(counts, &index))
}

/// Join counts with course metadata and sort by count descending, then id.
///
/// Counts for unknown courses are dropped.
pub fn rank_courses(counts: Vec<(String, i64)>, index: &JoinIndex) -> Vec<TopCourse> {
    let mut ranked: Vec<TopCourse> = counts
        .into_iter()
        .filter_map(|(course_id, enroll_count)| {
            index.course(&course_id).map(|course| TopCourse {
                course_id,
                course_name: course.course_name.clone(),
                instructor: course.instructor.clone(),
                enroll_count,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.enroll_count
            .cmp(&a.enroll_count)
            .then_with(|| a.course_id.cmp(&b.course_id))
    });
    ranked
}

/// Distinct students enrolled in a course, in enrollment order
pub async fn students_in_course(pool: &SqlitePool, course_id: &str) -> Result<Vec<Student>> {
    if courses::get_course(pool, course_id).await?.is_none() {
        return Err(Error::NotFound(format!("Course {}", course_id)));
    }

    let rows = enrollments::list_enrollments_for_course(pool, course_id).await?;
    let index = load_index(pool, &rows).await?;

    let mut seen = HashSet::new();
    Ok(rows
        .iter()
        .filter(|e| seen.insert(e.student_id.clone()))
        .filter_map(|e| index.student(&e.student_id).cloned())
        .collect())
}

/// Students with no enrollment at all
pub async fn students_not_enrolled(pool: &SqlitePool) -> Result<Vec<Student>> {
    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT student_id, name, age, grade, email, created_at
        FROM students s
        WHERE NOT EXISTS (SELECT 1 FROM enrollments e WHERE e.student_id = s.student_id)
        ORDER BY s.rowid
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(students)
}

/// Every enrollment whose student and course both exist
pub async fn student_courses(pool: &SqlitePool) -> Result<Vec<StudentCourse>> {
    let rows = enrollments::list_enrollments(pool).await?;
    let index = load_index(pool, &rows).await?;

    Ok(rows
        .iter()
        .filter_map(|e| {
            let student = index.student(&e.student_id)?;
            let course = index.course(&e.course_id)?;
            Some(join_row(student, course))
        })
        .collect())
}

fn join_row(student: &Student, course: &Course) -> StudentCourse {
    StudentCourse {
        student_id: student.student_id.clone(),
        name: student.name.clone(),
        course_id: course.course_id.clone(),
        course_name: course.course_name.clone(),
        instructor: course.instructor.clone(),
    }
}

/// Roster for the course with this name (case-insensitive)
pub async fn students_by_course_name(pool: &SqlitePool, course_name: &str) -> Result<CourseRoster> {
    if course_name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be blank".to_string()));
    }

    let course = courses::find_course_by_name(pool, course_name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Course named '{}'", course_name.trim())))?;

    let students = students_in_course(pool, &course.course_id)
        .await?
        .into_iter()
        .map(|s| RosterEntry {
            student_id: s.student_id,
            name: s.name,
            grade: s.grade,
        })
        .collect();

    Ok(CourseRoster {
        course_id: course.course_id,
        course_name: course.course_name,
        students,
    })
}
