use super::collector::{collect, ScanIssue};
use super::domain::{Outcome, SubmissionRecord};
use super::relocate::{FileStore, LocalFileStore};
use super::report::{ReportPaths, ReportWriter};
use super::roster::Roster;
use super::selection::{execute, SelectionEngine};
use crate::config::IngestConfig;
use crate::error::AppError;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

/// Everything a run produced, in roster order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub course_code: String,
    pub deadline: String,
    pub students: usize,
    pub receipts_scanned: usize,
    pub students_with_receipts: usize,
    pub accepted: Vec<SubmissionRecord>,
    pub bad: Vec<SubmissionRecord>,
    pub missing: Vec<SubmissionRecord>,
    pub audit: Vec<SubmissionRecord>,
    pub issues: Vec<ScanIssue>,
    pub reports: ReportPaths,
}

/// One full selection pass over a Learn export.
///
/// Not safe to run concurrently against the same folders: the pipeline assumes it is the
/// only process touching the source and output directories.
pub struct IngestPipeline<S = LocalFileStore> {
    config: IngestConfig,
    store: S,
}

impl IngestPipeline<LocalFileStore> {
    pub fn new(config: IngestConfig) -> Self {
        Self::with_store(config, LocalFileStore)
    }
}

impl<S: FileStore> IngestPipeline<S> {
    pub fn with_store(config: IngestConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn run(&self) -> Result<RunSummary, AppError> {
        self.run_at(Local::now().naive_local())
    }

    /// Run with an explicit start time, used to stamp the report file names.
    pub fn run_at(&self, started: NaiveDateTime) -> Result<RunSummary, AppError> {
        let config = &self.config;
        config.prepare()?;

        info!(
            course = %config.course_code,
            deadline = %config.deadline,
            learn_folder = %config.source_dir.display(),
            output_folder = %config.output_dir.display(),
            "starting ingest"
        );

        let roster = Roster::from_path(&config.roster_path)?;
        if roster.is_empty() {
            warn!(
                class_list = %config.roster_path.display(),
                "class list has no students; check the file is the right one"
            );
        }
        info!(students = roster.len(), "class list loaded");

        let collection = collect(&config.source_dir, &roster, &config.deadline);
        info!(
            receipts = collection.receipts_scanned,
            students = collection.student_count(),
            skipped = collection.issues.len(),
            "learn receipts collected"
        );

        let engine = SelectionEngine::new(config);
        let mut accepted = Vec::new();
        let mut bad = Vec::new();
        let mut missing = Vec::new();
        let mut audit = Vec::new();

        for student in roster.students() {
            let group = collection.candidates_for(&student.student_id);
            let plan = engine.plan(student, group, &self.store);
            let result = execute(plan, &self.store);

            audit.extend(result.audit);
            match result.outcome {
                Outcome::Accepted(record) => accepted.push(record),
                Outcome::BadSubmission(record) => bad.push(record),
                Outcome::NoSubmission(record) => missing.push(record),
            }
        }

        info!(
            accepted = accepted.len(),
            bad = bad.len(),
            missing = missing.len(),
            "selection complete"
        );

        let writer = ReportWriter::new(&config.output_dir, &config.course_code, started);
        let reports = writer.write_all(&accepted, &bad, &missing, &audit)?;
        info!(summary = %reports.submission_summary.display(), "reports written");

        Ok(RunSummary {
            course_code: config.course_code.clone(),
            deadline: config.deadline.to_string(),
            students: roster.len(),
            receipts_scanned: collection.receipts_scanned,
            students_with_receipts: collection.student_count(),
            accepted,
            bad,
            missing,
            audit,
            issues: collection.issues,
            reports,
        })
    }
}
