use super::domain::SubmissionRecord;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const RUN_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug, thiserror::Error)]
#[error("could not write report {path}: {source}")]
pub struct ReportError {
    path: PathBuf,
    #[source]
    source: csv::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Success,
    Errors,
    NoSubmission,
    SubmissionSummary,
}

impl ReportKind {
    pub const fn suffix(self) -> &'static str {
        match self {
            ReportKind::Success => "learn-success",
            ReportKind::Errors => "learn-errors",
            ReportKind::NoSubmission => "learn-nosubmission",
            ReportKind::SubmissionSummary => "learn-submissionsummary",
        }
    }
}

/// Locations of the four CSV files written for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPaths {
    pub success: PathBuf,
    pub errors: PathBuf,
    pub no_submission: PathBuf,
    pub submission_summary: PathBuf,
}

/// Writes reports into `dir`, each prefixed with the run stamp and course code so that
/// repeated runs never overwrite one another.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    prefix: String,
}

impl ReportWriter {
    pub fn new(dir: &Path, course_code: &str, run_started: NaiveDateTime) -> Self {
        let stamp = run_started.format(RUN_STAMP_FORMAT);
        let prefix = if course_code.trim().is_empty() {
            stamp.to_string()
        } else {
            format!("{stamp}-{}", course_code.trim())
        };
        Self {
            dir: dir.to_path_buf(),
            prefix,
        }
    }

    pub fn path_for(&self, kind: ReportKind) -> PathBuf {
        self.dir.join(format!("{}-{}.csv", self.prefix, kind.suffix()))
    }

    pub fn write_all(
        &self,
        accepted: &[SubmissionRecord],
        bad: &[SubmissionRecord],
        missing: &[SubmissionRecord],
        audit: &[SubmissionRecord],
    ) -> Result<ReportPaths, ReportError> {
        Ok(ReportPaths {
            success: self.write(ReportKind::Success, accepted)?,
            errors: self.write(ReportKind::Errors, bad)?,
            no_submission: self.write(ReportKind::NoSubmission, missing)?,
            submission_summary: self.write(ReportKind::SubmissionSummary, audit)?,
        })
    }

    pub fn write(
        &self,
        kind: ReportKind,
        records: &[SubmissionRecord],
    ) -> Result<PathBuf, ReportError> {
        let path = self.path_for(kind);
        write_records(&path, records).map_err(|source| ReportError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn write_records(path: &Path, records: &[SubmissionRecord]) -> Result<(), csv::Error> {
    // Headers are written by hand so that empty reports still carry them.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(SubmissionRecord::HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
