use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Layout used for submission stamps in receipts and reports.
pub const SUBMISSION_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// One row of the class list after identifier normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub exam_number: String,
    pub extra_time: u32,
}

impl StudentRecord {
    /// File name a manually prepared script must use, e.g. `s1234567.pdf`.
    pub fn manual_file_name(&self) -> String {
        format!("{}.pdf", self.student_id.to_ascii_lowercase())
    }

    pub fn output_file_name(&self, timeliness: Timeliness) -> String {
        match timeliness {
            Timeliness::Late => format!("LATE-{}.pdf", self.exam_number),
            Timeliness::OnTime | Timeliness::Manual => format!("{}.pdf", self.exam_number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeliness {
    OnTime,
    Late,
    Manual,
}

impl Timeliness {
    pub const fn label(self) -> &'static str {
        match self {
            Timeliness::OnTime => "",
            Timeliness::Late => "LATE",
            Timeliness::Manual => "Manual",
        }
    }
}

/// Audit label attached to every submission the engine looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    ToMark,
    Superseded,
    LateExcluded,
    Bad,
    Manual,
    NoSubmission,
}

impl Disposition {
    pub const fn label(self) -> &'static str {
        match self {
            Disposition::ToMark => "to mark",
            Disposition::Superseded => "superseded",
            Disposition::LateExcluded => "late-excluded",
            Disposition::Bad => "bad submission",
            Disposition::Manual => "manual",
            Disposition::NoSubmission => "no submission",
        }
    }
}

/// A single Learn receipt matched to a roster student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSubmission {
    pub student_id: String,
    pub exam_number: String,
    pub extra_time: u32,
    pub submitted_at: NaiveDateTime,
    pub receipt_path: PathBuf,
    pub payload_paths: Vec<PathBuf>,
    pub filetype_error: Option<String>,
    pub late: bool,
}

impl CandidateSubmission {
    pub fn payload_count(&self) -> usize {
        self.payload_paths.len()
    }

    pub fn timeliness(&self) -> Timeliness {
        if self.late {
            Timeliness::Late
        } else {
            Timeliness::OnTime
        }
    }

    /// Receipt plus payloads: everything removed when this attempt is discarded.
    pub fn owned_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.receipt_path.as_path())
            .chain(self.payload_paths.iter().map(PathBuf::as_path))
    }

    /// Whether this candidate can be filed automatically.
    pub fn is_clean(&self) -> bool {
        self.payload_count() == 1 && self.filetype_error.is_none()
    }

    pub fn record(&self, disposition: Disposition) -> SubmissionRecord {
        SubmissionRecord {
            student_id: self.student_id.clone(),
            exam_number: self.exam_number.clone(),
            date_submitted: self.submitted_at.format(SUBMISSION_STAMP_FORMAT).to_string(),
            late_submission: self.timeliness().label().to_string(),
            extra_time: self.extra_time,
            filename: self
                .payload_paths
                .first()
                .map(|path| file_name_of(path))
                .unwrap_or_default(),
            number_of_files: self.payload_count(),
            filetype_error: self.filetype_error.clone().unwrap_or_default(),
            receipt_filename: file_name_of(&self.receipt_path),
            to_mark: disposition.label().to_string(),
            output_file: String::new(),
        }
    }
}

/// Row shared by every report; column names follow the Learn export conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "UUN")]
    pub student_id: String,
    #[serde(rename = "ExamNumber")]
    pub exam_number: String,
    #[serde(rename = "DateSubmitted")]
    pub date_submitted: String,
    #[serde(rename = "LateSubmission")]
    pub late_submission: String,
    #[serde(rename = "ExtraTime")]
    pub extra_time: u32,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "NumberOfFiles")]
    pub number_of_files: usize,
    #[serde(rename = "FiletypeError")]
    pub filetype_error: String,
    #[serde(rename = "ReceiptFilename")]
    pub receipt_filename: String,
    #[serde(rename = "ToMark")]
    pub to_mark: String,
    #[serde(rename = "OutputFile")]
    pub output_file: String,
}

impl SubmissionRecord {
    pub const HEADERS: [&'static str; 11] = [
        "UUN",
        "ExamNumber",
        "DateSubmitted",
        "LateSubmission",
        "ExtraTime",
        "Filename",
        "NumberOfFiles",
        "FiletypeError",
        "ReceiptFilename",
        "ToMark",
        "OutputFile",
    ];

    /// Record for a student with nothing in Learn, before the manual check.
    pub fn for_student(student: &StudentRecord, disposition: Disposition) -> Self {
        Self {
            student_id: student.student_id.clone(),
            exam_number: student.exam_number.clone(),
            date_submitted: String::new(),
            late_submission: String::new(),
            extra_time: student.extra_time,
            filename: String::new(),
            number_of_files: 0,
            filetype_error: String::new(),
            receipt_filename: String::new(),
            to_mark: disposition.label().to_string(),
            output_file: String::new(),
        }
    }
}

/// Final classification of one roster student. Exactly one per student per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted(SubmissionRecord),
    BadSubmission(SubmissionRecord),
    NoSubmission(SubmissionRecord),
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn student() -> StudentRecord {
        StudentRecord {
            student_id: "S1234567".to_string(),
            exam_number: "B012345".to_string(),
            extra_time: 0,
        }
    }

    #[test]
    fn output_names_follow_timeliness() {
        let student = student();
        assert_eq!(student.output_file_name(Timeliness::OnTime), "B012345.pdf");
        assert_eq!(student.output_file_name(Timeliness::Manual), "B012345.pdf");
        assert_eq!(student.output_file_name(Timeliness::Late), "LATE-B012345.pdf");
        assert_eq!(student.manual_file_name(), "s1234567.pdf");
    }

    #[test]
    fn candidate_record_carries_receipt_metadata() {
        let candidate = CandidateSubmission {
            student_id: "S1234567".to_string(),
            exam_number: "B012345".to_string(),
            extra_time: 15,
            submitted_at: NaiveDate::from_ymd_opt(2020, 4, 22)
                .and_then(|date| date.and_hms_opt(15, 45, 12))
                .expect("valid timestamp"),
            receipt_path: PathBuf::from("learn/Exam_s1234567_attempt_2020-04-22-15-45-12.txt"),
            payload_paths: vec![
                PathBuf::from("learn/a.pdf"),
                PathBuf::from("learn/b.pdf"),
            ],
            filetype_error: None,
            late: false,
        };

        let record = candidate.record(Disposition::Bad);
        assert_eq!(record.date_submitted, "2020-04-22-15-45-12");
        assert_eq!(record.filename, "a.pdf");
        assert_eq!(record.number_of_files, 2);
        assert_eq!(
            record.receipt_filename,
            "Exam_s1234567_attempt_2020-04-22-15-45-12.txt"
        );
        assert_eq!(record.to_mark, "bad submission");
        assert!(!candidate.is_clean());
        assert_eq!(candidate.owned_paths().count(), 3);
    }
}
