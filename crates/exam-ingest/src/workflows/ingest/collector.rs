use super::domain::CandidateSubmission;
use super::lateness::Deadline;
use super::receipt::{parse_receipt, ReceiptError};
use super::roster::Roster;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Receipts found in the Learn folder, grouped per student in discovery order.
#[derive(Debug, Default)]
pub struct Collection {
    groups: HashMap<String, Vec<CandidateSubmission>>,
    pub receipts_scanned: usize,
    pub issues: Vec<ScanIssue>,
}

impl Collection {
    pub fn candidates_for(&self, student_id: &str) -> &[CandidateSubmission] {
        self.groups
            .get(student_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn student_count(&self) -> usize {
        self.groups.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// A receipt that was skipped; the run carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanIssue {
    UnrecognizedName { path: PathBuf },
    UnknownStudent { path: PathBuf, student_id: String },
    UnreadableReceipt { path: PathBuf, reason: String },
    Walk { reason: String },
}

impl ScanIssue {
    pub fn describe(&self) -> String {
        match self {
            ScanIssue::UnrecognizedName { path } => {
                format!("{}: no student id in file name", path.display())
            }
            ScanIssue::UnknownStudent { path, student_id } => {
                format!("{}: {} is not on the class list", path.display(), student_id)
            }
            ScanIssue::UnreadableReceipt { path, reason } => {
                format!("{}: {}", path.display(), reason)
            }
            ScanIssue::Walk { reason } => format!("could not scan folder: {reason}"),
        }
    }
}

pub fn collect(source_dir: &Path, roster: &Roster, deadline: &Deadline) -> Collection {
    let mut collection = Collection::default();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry in learn folder");
                collection.issues.push(ScanIssue::Walk {
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_receipt(entry.path()) {
            continue;
        }

        match candidate_from_receipt(entry.path(), roster, deadline) {
            Ok(candidate) => {
                debug!(
                    student = %candidate.student_id,
                    receipt = %entry.path().display(),
                    submitted_at = %candidate.submitted_at,
                    late = candidate.late,
                    "collected receipt"
                );
                collection
                    .groups
                    .entry(candidate.student_id.clone())
                    .or_default()
                    .push(candidate);
                collection.receipts_scanned += 1;
            }
            Err(issue) => {
                warn!(issue = %issue.describe(), "skipping receipt");
                collection.issues.push(issue);
            }
        }
    }

    collection
}

fn candidate_from_receipt(
    path: &Path,
    roster: &Roster,
    deadline: &Deadline,
) -> Result<CandidateSubmission, ScanIssue> {
    let student_id = student_id_from_name(path).ok_or_else(|| ScanIssue::UnrecognizedName {
        path: path.to_path_buf(),
    })?;

    let student = roster
        .get(&student_id)
        .ok_or_else(|| ScanIssue::UnknownStudent {
            path: path.to_path_buf(),
            student_id: student_id.clone(),
        })?;

    let receipt = parse_receipt(path).map_err(|err: ReceiptError| ScanIssue::UnreadableReceipt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    if let Some(named) = receipt.student_id.as_deref() {
        if named != student_id {
            warn!(
                receipt = %path.display(),
                file_name_id = %student_id,
                receipt_id = %named,
                "receipt names a different student than its file name; using the file name"
            );
        }
    }

    let folder = path.parent().unwrap_or_else(|| Path::new("."));
    let payload_paths = receipt
        .payload_files
        .iter()
        .map(|name| folder.join(name))
        .collect();

    Ok(CandidateSubmission {
        late: deadline.is_late(receipt.submitted_at, student.extra_time),
        student_id: student.student_id.clone(),
        exam_number: student.exam_number.clone(),
        extra_time: student.extra_time,
        submitted_at: receipt.submitted_at,
        receipt_path: path.to_path_buf(),
        payload_paths,
        filetype_error: receipt.filetype_error,
    })
}

/// Receipt names end right after the attempt stamp. Uploaded `.txt` files carry the
/// stamp followed by their original name, so they are skipped here.
fn is_receipt(path: &Path) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)_attempt_\d{4}(-\d{2}){5}\.txt$").expect("receipt pattern compiles")
    });

    path.file_name()
        .is_some_and(|name| pattern.is_match(&name.to_string_lossy()))
}

pub(crate) fn student_id_from_name(path: &Path) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)_(s[0-9]{7})_attempt_").expect("student id pattern compiles")
    });

    let name = path.file_name()?.to_string_lossy();
    pattern
        .captures(&name)
        .and_then(|captures| captures.get(1))
        .map(|uun| uun.as_str().to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ingest::domain::StudentRecord;
    use std::fs;

    fn roster() -> Roster {
        Roster::from_students(vec![
            StudentRecord {
                student_id: "S1234567".to_string(),
                exam_number: "B001".to_string(),
                extra_time: 0,
            },
            StudentRecord {
                student_id: "S7654321".to_string(),
                exam_number: "B002".to_string(),
                extra_time: 30,
            },
        ])
        .expect("roster builds")
    }

    fn write_receipt(dir: &Path, uun: &str, stamp: &str) -> PathBuf {
        let payload = format!("Exam_{uun}_attempt_{stamp}_answers.pdf");
        let path = dir.join(format!("Exam_{uun}_attempt_{stamp}.txt"));
        fs::write(
            &path,
            format!("Name: Student ({uun})\nFiles:\n\tOriginal filename: answers.pdf\n\tFilename: {payload}\n"),
        )
        .expect("write receipt");
        fs::write(dir.join(payload), b"%PDF-1.4").expect("write payload");
        path
    }

    #[test]
    fn student_id_is_case_insensitive_and_uppercased() {
        assert_eq!(
            student_id_from_name(Path::new("Exam_S1234567_attempt_2020-04-22-15-00-00.txt")),
            Some("S1234567".to_string())
        );
        assert_eq!(
            student_id_from_name(Path::new("Exam_s1234567_attempt_2020-04-22-15-00-00.txt")),
            Some("S1234567".to_string())
        );
        assert!(student_id_from_name(Path::new("readme.txt")).is_none());
    }

    #[test]
    fn groups_receipts_and_tags_lateness_with_extra_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_receipt(dir.path(), "s1234567", "2020-04-22-15-30-00");
        write_receipt(dir.path(), "s1234567", "2020-04-22-16-05-00");
        write_receipt(dir.path(), "s7654321", "2020-04-22-16-20-00");
        let deadline = Deadline::parse("2020-04-22-16-00").expect("deadline");

        let collection = collect(dir.path(), &roster(), &deadline);

        assert_eq!(collection.receipts_scanned, 3);
        assert_eq!(collection.student_count(), 2);
        assert_eq!(collection.candidate_count(), 3);
        assert!(collection.issues.is_empty());

        let first = collection.candidates_for("S1234567");
        assert_eq!(first.len(), 2);
        assert!(!first[0].late);
        assert!(first[1].late);
        assert_eq!(first[0].exam_number, "B001");
        assert_eq!(first[0].payload_count(), 1);
        assert!(first[0].payload_paths[0].starts_with(dir.path()));

        let extra = collection.candidates_for("S7654321");
        assert!(!extra[0].late, "30 minutes extra time covers 16:20");
        assert!(collection.candidates_for("S0000000").is_empty());
    }

    #[test]
    fn problem_receipts_become_issues_without_stopping_the_scan() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_receipt(dir.path(), "s1234567", "2020-04-22-15-30-00");
        write_receipt(dir.path(), "s9999999", "2020-04-22-15-30-00");
        fs::write(dir.path().join("Exam_guest_attempt_2020-04-22-15-30-00.txt"), "Name: x")
            .expect("write guest receipt");
        fs::write(dir.path().join("notes.txt"), "hello").expect("write notes");
        fs::write(
            dir.path().join("Exam_s7654321_attempt_2020-02-31-10-00-00.txt"),
            "Name: x",
        )
        .expect("write bad receipt");
        let deadline = Deadline::parse("2020-04-22-16-00").expect("deadline");

        let collection = collect(dir.path(), &roster(), &deadline);

        assert_eq!(collection.receipts_scanned, 1);
        assert_eq!(collection.issues.len(), 3);
        assert!(collection.issues.iter().any(|issue| matches!(
            issue,
            ScanIssue::UnknownStudent { student_id, .. } if student_id == "S9999999"
        )));
        assert!(collection
            .issues
            .iter()
            .any(|issue| matches!(issue, ScanIssue::UnrecognizedName { .. })));
        assert!(collection
            .issues
            .iter()
            .any(|issue| matches!(issue, ScanIssue::UnreadableReceipt { .. })));
    }

    #[test]
    fn uploaded_text_files_are_not_receipts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stamp = "2020-04-22-15-40-00";
        let answers = format!("Exam_s1234567_attempt_{stamp}_answers.pdf");
        let notes = format!("Exam_s1234567_attempt_{stamp}_notes.txt");
        fs::write(
            dir.path().join(format!("Exam_s1234567_attempt_{stamp}.txt")),
            format!(
                "Name: Student (s1234567)\nFiles:\n\tFilename: {answers}\n\tFilename: {notes}\n"
            ),
        )
        .expect("write receipt");
        fs::write(dir.path().join(&answers), b"%PDF-1.4").expect("write pdf upload");
        fs::write(dir.path().join(&notes), "working").expect("write text upload");
        let deadline = Deadline::parse("2020-04-22-16-00").expect("deadline");

        let collection = collect(dir.path(), &roster(), &deadline);

        assert_eq!(collection.receipts_scanned, 1);
        assert!(collection.issues.is_empty());
        let candidates = collection.candidates_for("S1234567");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].payload_count(), 2);
        assert!(candidates[0].filetype_error.is_some());
    }

    #[test]
    fn receipt_names_must_end_at_the_stamp() {
        assert!(is_receipt(Path::new("Exam_s1234567_attempt_2020-04-22-15-40-00.txt")));
        assert!(is_receipt(Path::new("Exam_s1234567_attempt_2020-04-22-15-40-00.TXT")));
        assert!(!is_receipt(Path::new(
            "Exam_s1234567_attempt_2020-04-22-15-40-00_notes.txt"
        )));
        assert!(!is_receipt(Path::new("notes.txt")));
    }

    #[test]
    fn nested_folders_are_scanned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("batch-2");
        fs::create_dir(&nested).expect("nested dir");
        write_receipt(&nested, "s1234567", "2020-04-22-15-30-00");
        let deadline = Deadline::parse("2020-04-22-16-00").expect("deadline");

        let collection = collect(dir.path(), &roster(), &deadline);
        let candidates = collection.candidates_for("S1234567");
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].payload_paths[0].starts_with(&nested));
    }
}
