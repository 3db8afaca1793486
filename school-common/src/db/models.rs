//! Record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub age: i64,
    pub grade: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub instructor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    /// Hyphenated lowercase UUID assigned by the store
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a student. `student_id` is assigned when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStudent {
    #[serde(default)]
    pub student_id: Option<String>,
    pub name: String,
    pub age: i64,
    pub grade: String,
    pub email: String,
}

/// Partial student update; only supplied fields change
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub grade: Option<String>,
    pub email: Option<String>,
}

impl StudentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.grade.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCourse {
    #[serde(default)]
    pub course_id: Option<String>,
    pub course_name: String,
    pub instructor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEnrollment {
    pub student_id: String,
    pub course_id: String,
}

pub const MAX_AGE: i64 = 150;

/// Student ids that collide with static routes under `/students/`
pub const RESERVED_STUDENT_IDS: &[&str] = &["search"];

/// Check a student name/age/grade/email combination
pub fn validate_student_fields(
    name: Option<&str>,
    age: Option<i64>,
    grade: Option<&str>,
    email: Option<&str>,
) -> Result<(), String> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err("name must not be blank".to_string());
    }
    if let Some(age) = age {
        if !(0..=MAX_AGE).contains(&age) {
            return Err(format!("age must be between 0 and {}", MAX_AGE));
        }
    }
    if grade.is_some_and(|g| g.trim().is_empty()) {
        return Err("grade must not be blank".to_string());
    }
    if email.is_some_and(|e| !e.contains('@')) {
        return Err("email must contain '@'".to_string());
    }
    Ok(())
}

fn validate_identifier(field: &str, value: Option<&str>) -> Result<(), String> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        return Err(format!("{} must not be blank", field));
    }
    Ok(())
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), String> {
        validate_identifier("student_id", self.student_id.as_deref())?;
        if let Some(id) = self.student_id.as_deref().map(str::trim) {
            if RESERVED_STUDENT_IDS.contains(&id) {
                return Err(format!("student_id '{}' is reserved", id));
            }
        }
        validate_student_fields(
            Some(&self.name),
            Some(self.age),
            Some(&self.grade),
            Some(&self.email),
        )
    }
}

impl StudentUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_student_fields(
            self.name.as_deref(),
            self.age,
            self.grade.as_deref(),
            self.email.as_deref(),
        )
    }
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), String> {
        validate_identifier("course_id", self.course_id.as_deref())?;
        if self.course_name.trim().is_empty() {
            return Err("course_name must not be blank".to_string());
        }
        if self.instructor.trim().is_empty() {
            return Err("instructor must not be blank".to_string());
        }
        Ok(())
    }
}

impl NewEnrollment {
    pub fn validate(&self) -> Result<(), String> {
        validate_identifier("student_id", Some(&self.student_id))?;
        validate_identifier("course_id", Some(&self.course_id))
    }
}
