//! school-import - load students, courses and enrollments CSV files
//!
//! Files are loaded in that order so enrollments can reference the rows just
//! imported. Each file is all-or-nothing.

use anyhow::{bail, Context, Result};
use clap::Parser;
use school_common::config::ServiceConfig;
use school_common::db::init_database;
use school_common::import::{self, ImportSummary};
use school_api::cli::{init_tracing, ConfigArgs};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "school-import")]
#[command(about = "Bulk-load school records from CSV files")]
#[command(version)]
struct Args {
    /// CSV with name, age, grade, email (optional student_id)
    #[arg(long)]
    students: Option<PathBuf>,

    /// CSV with course_name, instructor (optional course_id)
    #[arg(long)]
    courses: Option<PathBuf>,

    /// CSV with student_id, course_id
    #[arg(long)]
    enrollments: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.students.is_none() && args.courses.is_none() && args.enrollments.is_none() {
        bail!("Nothing to import: pass --students, --courses or --enrollments");
    }

    let config = ServiceConfig::resolve(args.config.into()).context("Invalid configuration")?;
    init_tracing(&config.log_level)?;

    let pool = init_database(&config.database_path).await?;
    info!("Importing into {}", config.database_path.display());

    if let Some(path) = &args.students {
        let bytes = read(path).await?;
        let filename = path.file_name().and_then(|n| n.to_str());
        let summary = import::import_students(&pool, filename, &bytes)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;
        report("students", path, &summary);
    }

    if let Some(path) = &args.courses {
        let bytes = read(path).await?;
        let summary = import::import_courses(&pool, &bytes)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;
        report("courses", path, &summary);
    }

    if let Some(path) = &args.enrollments {
        let bytes = read(path).await?;
        let summary = import::import_enrollments(&pool, &bytes)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;
        report("enrollments", path, &summary);
    }

    pool.close().await;
    Ok(())
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn report(kind: &str, path: &Path, summary: &ImportSummary) {
    info!("Loaded {} {} from {}", summary.inserted, kind, path.display());
}
