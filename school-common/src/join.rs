//! Enrollment join resolver
//!
//! Turns flat enrollment rows into responses with the referenced student and
//! course embedded. A reference embeds a record only when one with exactly
//! that identifier exists at query time; otherwise it is `null`.

use crate::db::models::{Course, Enrollment, Student};
use crate::db::{courses, students};
use crate::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

/// Enrollment with its references resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEnrollment {
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub student: Option<Student>,
    pub course: Option<Course>,
}

/// Identifier → record maps, built once per request
#[derive(Debug, Default)]
pub struct JoinIndex {
    students: HashMap<String, Student>,
    courses: HashMap<String, Course>,
}

impl JoinIndex {
    /// Build the index. On duplicate identifiers the first record wins.
    pub fn new(students: Vec<Student>, courses: Vec<Course>) -> Self {
        let mut index = Self::default();
        for student in students {
            index
                .students
                .entry(student.student_id.clone())
                .or_insert(student);
        }
        for course in courses {
            index.courses.entry(course.course_id.clone()).or_insert(course);
        }
        index
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.get(student_id)
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }

    pub fn resolve(&self, enrollment: Enrollment) -> ResolvedEnrollment {
        ResolvedEnrollment {
            student: self.student(&enrollment.student_id).cloned(),
            course: self.course(&enrollment.course_id).cloned(),
            enrollment_id: enrollment.enrollment_id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
        }
    }
}

/// Resolve a single enrollment with two point lookups
pub async fn resolve_enrollment(
    pool: &SqlitePool,
    enrollment: Enrollment,
) -> Result<ResolvedEnrollment> {
    let student = students::get_student(pool, &enrollment.student_id).await?;
    let course = courses::get_course(pool, &enrollment.course_id).await?;

    Ok(ResolvedEnrollment {
        enrollment_id: enrollment.enrollment_id,
        student_id: enrollment.student_id,
        course_id: enrollment.course_id,
        student,
        course,
    })
}

/// Resolve many enrollments with one multi-key fetch per referenced table
pub async fn resolve_enrollments(
    pool: &SqlitePool,
    enrollments: Vec<Enrollment>,
) -> Result<Vec<ResolvedEnrollment>> {
    let index = load_index(pool, &enrollments).await?;
    Ok(enrollments.into_iter().map(|e| index.resolve(e)).collect())
}

/// Fetch exactly the students and courses referenced by `enrollments`
pub async fn load_index(pool: &SqlitePool, enrollments: &[Enrollment]) -> Result<JoinIndex> {
    let student_ids: Vec<String> = enrollments
        .iter()
        .map(|e| e.student_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let course_ids: Vec<String> = enrollments
        .iter()
        .map(|e| e.course_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let students = students::get_students_by_ids(pool, &student_ids).await?;
    let courses = courses::get_courses_by_ids(pool, &course_ids).await?;

    Ok(JoinIndex::new(students, courses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enrollments::{insert_enrollment, list_enrollments};
    use crate::db::init::open_in_memory;
    use crate::db::models::{NewCourse, NewEnrollment, NewStudent};
    use chrono::Utc;

    async fn seed(pool: &SqlitePool) {
        students::insert_student(
            pool,
            NewStudent {
                student_id: Some("s1".to_string()),
                name: "Divya".to_string(),
                age: 19,
                grade: "A".to_string(),
                email: "divya@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        courses::insert_course(
            pool,
            NewCourse {
                course_id: Some("c1".to_string()),
                course_name: "Biology".to_string(),
                instructor: "Dr. Nair".to_string(),
            },
        )
        .await
        .unwrap();
    }

    fn enroll(student_id: &str, course_id: &str) -> NewEnrollment {
        NewEnrollment {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_embeds_matches_and_nulls() {
        let pool = open_in_memory().await.unwrap();
        seed(&pool).await;
        insert_enrollment(&pool, enroll("s1", "c1")).await.unwrap();
        insert_enrollment(&pool, enroll("s1", "missing")).await.unwrap();
        insert_enrollment(&pool, enroll("ghost", "c1")).await.unwrap();

        let resolved = resolve_enrollments(&pool, list_enrollments(&pool).await.unwrap())
            .await
            .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].student.as_ref().unwrap().name, "Divya");
        assert_eq!(resolved[0].course.as_ref().unwrap().course_name, "Biology");
        assert!(resolved[1].student.is_some());
        assert!(resolved[1].course.is_none());
        assert!(resolved[2].student.is_none());
        assert!(resolved[2].course.is_some());
    }

    #[tokio::test]
    async fn test_single_and_batched_agree() {
        let pool = open_in_memory().await.unwrap();
        seed(&pool).await;
        let enrollment = insert_enrollment(&pool, enroll("s1", "c1")).await.unwrap();

        let single = resolve_enrollment(&pool, enrollment.clone()).await.unwrap();
        let batched = resolve_enrollments(&pool, vec![enrollment]).await.unwrap();
        assert_eq!(single, batched[0]);
    }

    #[test]
    fn test_index_first_record_wins() {
        let now = Utc::now();
        let course = |name: &str| Course {
            course_id: "c1".to_string(),
            course_name: name.to_string(),
            instructor: "X".to_string(),
            created_at: now,
        };
        let index = JoinIndex::new(vec![], vec![course("First"), course("Second")]);
        assert_eq!(index.course("c1").unwrap().course_name, "First");
        assert!(index.student("s1").is_none());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = open_in_memory().await.unwrap();
        assert!(resolve_enrollments(&pool, vec![]).await.unwrap().is_empty());
    }
}
