//! CSV import pipeline
//!
//! Parses CSV bytes into typed rows, checks the required column set and
//! bulk-inserts the rows in one transaction. Every rejection happens before
//! the first insert, and the insert itself is all-or-nothing.

use crate::db::models::{NewCourse, NewEnrollment, NewStudent};
use crate::db::{courses, enrollments, students};
use crate::error::ImportError;
use crate::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub ids: Vec<String>,
}

/// A row type that can be built from one CSV record
pub trait CsvRecord: Sized {
    /// Columns that must appear in the header
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Build and validate one row. The error is reported with the 1-based
    /// data row number (the header is not counted).
    fn from_row(row: &CsvRow<'_>) -> std::result::Result<Self, String>;
}

/// One data record with by-name column access
pub struct CsvRow<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    /// Value of a required column (guaranteed present by the header check)
    pub fn required(&self, column: &str) -> &'a str {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    /// Value of an optional column; blank counts as absent
    pub fn optional(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .filter(|v| !v.is_empty())
    }
}

/// Only `.csv` uploads are accepted
pub fn check_filename(filename: Option<&str>) -> std::result::Result<(), ImportError> {
    match filename {
        Some(name) if name.to_ascii_lowercase().ends_with(".csv") => Ok(()),
        Some(name) => Err(ImportError::UnsupportedFile(name.to_string())),
        None => Err(ImportError::UnsupportedFile("no filename".to_string())),
    }
}

/// Parse CSV bytes into rows of `T`
pub fn parse_csv<T: CsvRecord>(bytes: &[u8]) -> std::result::Result<Vec<T>, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ImportError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Malformed(e.to_string()))?
        .clone();

    let mut columns = HashMap::with_capacity(headers.len());
    for (i, name) in headers.iter().enumerate() {
        columns.entry(name.to_string()).or_insert(i);
    }

    let missing: Vec<String> = T::REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ImportError::Malformed(e.to_string()))?;
        let line = index as u64 + 1;
        let row = CsvRow {
            columns: &columns,
            record: &record,
        };
        rows.push(T::from_row(&row).map_err(|reason| ImportError::InvalidRow { line, reason })?);
    }

    if rows.is_empty() {
        return Err(ImportError::NoRows);
    }

    Ok(rows)
}

impl CsvRecord for NewStudent {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["name", "age", "grade", "email"];

    fn from_row(row: &CsvRow<'_>) -> std::result::Result<Self, String> {
        let age_raw = row.required("age");
        let age = age_raw
            .parse::<i64>()
            .map_err(|_| format!("age must be an integer (got '{}')", age_raw))?;

        let student = NewStudent {
            student_id: row.optional("student_id").map(str::to_string),
            name: row.required("name").to_string(),
            age,
            grade: row.required("grade").to_string(),
            email: row.required("email").to_string(),
        };
        student.validate()?;
        Ok(student)
    }
}

impl CsvRecord for NewCourse {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["course_name", "instructor"];

    fn from_row(row: &CsvRow<'_>) -> std::result::Result<Self, String> {
        let course = NewCourse {
            course_id: row.optional("course_id").map(str::to_string),
            course_name: row.required("course_name").to_string(),
            instructor: row.required("instructor").to_string(),
        };
        course.validate()?;
        Ok(course)
    }
}

impl CsvRecord for NewEnrollment {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["student_id", "course_id"];

    fn from_row(row: &CsvRow<'_>) -> std::result::Result<Self, String> {
        let enrollment = NewEnrollment {
            student_id: row.required("student_id").to_string(),
            course_id: row.required("course_id").to_string(),
        };
        enrollment.validate()?;
        Ok(enrollment)
    }
}

/// Import an uploaded students CSV
pub async fn import_students(
    pool: &SqlitePool,
    filename: Option<&str>,
    bytes: &[u8],
) -> Result<ImportSummary> {
    check_filename(filename)?;
    let rows = parse_csv::<NewStudent>(bytes)?;
    let ids = students::insert_students(pool, rows).await?;
    info!("Imported {} students", ids.len());
    Ok(ImportSummary {
        inserted: ids.len(),
        ids,
    })
}

pub async fn import_courses(pool: &SqlitePool, bytes: &[u8]) -> Result<ImportSummary> {
    let rows = parse_csv::<NewCourse>(bytes)?;
    let ids = courses::insert_courses(pool, rows).await?;
    info!("Imported {} courses", ids.len());
    Ok(ImportSummary {
        inserted: ids.len(),
        ids,
    })
}

pub async fn import_enrollments(pool: &SqlitePool, bytes: &[u8]) -> Result<ImportSummary> {
    let rows = parse_csv::<NewEnrollment>(bytes)?;
    let ids = enrollments::insert_enrollments(pool, rows).await?;
    info!("Imported {} enrollments", ids.len());
    Ok(ImportSummary {
        inserted: ids.len(),
        ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::open_in_memory;
    use crate::Error;

    const STUDENTS_CSV: &str = "student_id,name,age,grade,email\n\
        1,Asha,20,A,asha@example.com\n\
        2,Bala,22,B,bala@example.com\n";

    #[test]
    fn test_parse_students() {
        let rows = parse_csv::<NewStudent>(STUDENTS_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id.as_deref(), Some("1"));
        assert_eq!(rows[1].name, "Bala");
        assert_eq!(rows[1].age, 22);
    }

    #[test]
    fn test_header_whitespace_bom_and_extra_columns() {
        let csv = "\u{feff} name , age ,grade,email,notes\nAsha,20,A,asha@example.com,hi\n";
        let rows = parse_csv::<NewStudent>(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].name, "Asha");
        assert_eq!(rows[0].student_id, None);
    }

    #[test]
    fn test_missing_columns_listed() {
        let csv = "name,age,grade\nAsha,20,A\n";
        let err = parse_csv::<NewStudent>(csv.as_bytes()).unwrap_err();
        assert_eq!(err, ImportError::MissingColumns(vec!["email".to_string()]));
    }

    #[test]
    fn test_empty_and_header_only_are_distinct() {
        assert_eq!(parse_csv::<NewStudent>(b"").unwrap_err(), ImportError::EmptyFile);
        assert_eq!(parse_csv::<NewStudent>(b" \n\n").unwrap_err(), ImportError::EmptyFile);
        assert_eq!(
            parse_csv::<NewStudent>(b"name,age,grade,email\n").unwrap_err(),
            ImportError::NoRows
        );
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let csv = "name,age,grade,email\nAsha,20,A\n";
        assert!(matches!(
            parse_csv::<NewStudent>(csv.as_bytes()),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_row_reports_line() {
        let csv = "name,age,grade,email\nAsha,20,A,asha@example.com\nBala,old,B,bala@example.com\n";
        match parse_csv::<NewStudent>(csv.as_bytes()) {
            Err(ImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("age"));
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let bytes = b"name,age,grade,email\nA\xff,18,A,a@x.io\n";
        assert!(matches!(
            parse_csv::<NewStudent>(bytes),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_reserved_student_id_is_invalid_row() {
        let csv = "student_id,name,age,grade,email\ns1,Asha,20,A,a@x.io\nsearch,Bala,22,B,b@x.io\n";
        match parse_csv::<NewStudent>(csv.as_bytes()) {
            Err(ImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("reserved"));
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_check_filename() {
        assert!(check_filename(Some("students.csv")).is_ok());
        assert!(check_filename(Some("STUDENTS.CSV")).is_ok());
        assert_eq!(
            check_filename(Some("students.xlsx")),
            Err(ImportError::UnsupportedFile("students.xlsx".to_string()))
        );
        assert!(check_filename(None).is_err());
    }

    #[tokio::test]
    async fn test_import_students_inserts_all_rows() {
        let pool = open_in_memory().await.unwrap();
        let summary = import_students(&pool, Some("students.csv"), STUDENTS_CSV.as_bytes())
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.ids, vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_email_inserts_nothing() {
        let pool = open_in_memory().await.unwrap();
        let csv = "name,age,grade\nAsha,20,A\n";
        let err = import_students(&pool, Some("students.csv"), csv.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Import(ImportError::MissingColumns(_))));
        assert!(students::list_students(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_courses_and_enrollments() {
        let pool = open_in_memory().await.unwrap();
        import_courses(&pool, b"course_id,course_name,instructor\n10,Maths,Rao\n")
            .await
            .unwrap();
        let summary = import_enrollments(&pool, b"student_id,course_id\n1,10\n2,10\n")
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
    }
}
