//! Reader for the per-attempt `.txt` receipts that Learn writes next to each upload.
//!
//! Only the fields the ingest needs are extracted: the student named on the receipt,
//! the attempt stamp (taken from the receipt's file name, which Learn always writes as
//! `<assignment>_<uun>_attempt_<YYYY-MM-DD-HH-MM-SS>.txt`) and the uploaded files.

use super::domain::SUBMISSION_STAMP_FORMAT;
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("failed to read receipt {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("receipt {path} has no attempt timestamp in its file name")]
    MissingTimestamp { path: PathBuf },
    #[error("receipt {path} has an unreadable attempt timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRecord {
    pub student_id: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub payload_files: Vec<String>,
    pub filetype_error: Option<String>,
}

pub fn parse_receipt(path: &Path) -> Result<ReceiptRecord, ReceiptError> {
    let submitted_at = attempt_stamp(path)?;
    let body = std::fs::read_to_string(path).map_err(|source| ReceiptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_body(&body, submitted_at))
}

fn attempt_stamp(path: &Path) -> Result<NaiveDateTime, ReceiptError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let value = attempt_pattern()
        .captures(&name)
        .and_then(|captures| captures.get(1))
        .map(|stamp| stamp.as_str().to_string())
        .ok_or_else(|| ReceiptError::MissingTimestamp {
            path: path.to_path_buf(),
        })?;

    NaiveDateTime::parse_from_str(&value, SUBMISSION_STAMP_FORMAT).map_err(|source| {
        ReceiptError::Timestamp {
            path: path.to_path_buf(),
            value,
            source,
        }
    })
}

fn parse_body(body: &str, submitted_at: NaiveDateTime) -> ReceiptRecord {
    let mut record = ReceiptRecord {
        student_id: None,
        submitted_at,
        payload_files: Vec::new(),
        filetype_error: None,
    };

    for line in body.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("Name:") {
            record.student_id = name_pattern()
                .captures(name)
                .and_then(|captures| captures.get(1))
                .map(|uun| uun.as_str().to_ascii_uppercase());
        } else if let Some(stored) = line.strip_prefix("Filename:") {
            let stored = stored.trim();
            if !stored.is_empty() {
                record.payload_files.push(stored.to_string());
            }
        }
    }

    let rejected: Vec<&str> = record
        .payload_files
        .iter()
        .map(String::as_str)
        .filter(|name| !is_pdf(name))
        .collect();
    if !rejected.is_empty() {
        record.filetype_error = Some(format!("not a PDF: {}", rejected.join("; ")));
    }

    record
}

fn is_pdf(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn attempt_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"_attempt_(\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2})")
            .expect("attempt pattern compiles")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\((s\d{7})\)").expect("name pattern compiles"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const RECEIPT: &str = "Name: Jane Doe (s1234567)\n\
Assignment: MATH00000 Exam\n\
Date Submitted: Wednesday, 22 April 2020 15:45:12 o'clock BST\n\
Current Mark: Needs Marking\n\
\n\
Submission Field:\n\
There is no student submission text data for this assignment.\n\
\n\
Files:\n\
\tOriginal filename: answers.pdf\n\
\tFilename: MATH00000 Exam_s1234567_attempt_2020-04-22-15-45-12_answers.pdf\n";

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 22)
            .and_then(|date| date.and_hms_opt(15, 45, 12))
            .expect("valid timestamp")
    }

    #[test]
    fn body_fields_are_extracted() {
        let record = parse_body(RECEIPT, stamp());
        assert_eq!(record.student_id.as_deref(), Some("S1234567"));
        assert_eq!(
            record.payload_files,
            ["MATH00000 Exam_s1234567_attempt_2020-04-22-15-45-12_answers.pdf"]
        );
        assert!(record.filetype_error.is_none());
    }

    #[test]
    fn non_pdf_uploads_raise_filetype_error() {
        let body = "Name: Jane Doe (s1234567)\nFiles:\n\
\tOriginal filename: page1.jpg\n\tFilename: Exam_s1234567_attempt_2020-04-22-15-45-12_page1.jpg\n\
\tOriginal filename: answers.PDF\n\tFilename: Exam_s1234567_attempt_2020-04-22-15-45-12_answers.PDF\n";
        let record = parse_body(body, stamp());
        assert_eq!(record.payload_files.len(), 2);
        let error = record.filetype_error.expect("jpg flagged");
        assert!(error.contains("page1.jpg"));
        assert!(!error.contains("answers.PDF"));
    }

    #[test]
    fn stamp_comes_from_receipt_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir
            .path()
            .join("MATH00000 Exam_s1234567_attempt_2020-04-22-15-45-12.txt");
        std::fs::write(&path, RECEIPT).expect("write receipt");

        let record = parse_receipt(&path).expect("receipt parses");
        assert_eq!(record.submitted_at, stamp());
    }

    #[test]
    fn missing_stamp_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, RECEIPT).expect("write receipt");

        assert!(matches!(
            parse_receipt(&path),
            Err(ReceiptError::MissingTimestamp { .. })
        ));
    }

    #[test]
    fn impossible_stamp_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir
            .path()
            .join("Exam_s1234567_attempt_2020-02-31-10-00-00.txt");
        std::fs::write(&path, RECEIPT).expect("write receipt");

        match parse_receipt(&path) {
            Err(ReceiptError::Timestamp { value, .. }) => assert_eq!(value, "2020-02-31-10-00-00"),
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }
}
