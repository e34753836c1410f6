//! Per-student selection of the one script that goes forward for marking.
//!
//! Planning is pure: [`SelectionEngine::select`] looks at a student's candidates and
//! returns a [`StudentPlan`] describing which files to discard, which file (if any) to
//! file into the output folder and what to write in the audit trail. [`execute`] then
//! carries the plan out against a [`FileStore`].

use super::domain::{
    CandidateSubmission, Disposition, Outcome, StudentRecord, SubmissionRecord, Timeliness,
};
use super::relocate::FileStore;
use crate::config::IngestConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A candidate the fold dropped, with the label it is audited under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discard {
    pub candidate: CandidateSubmission,
    pub disposition: Disposition,
}

/// One step of the reduction over a student's receipts.
///
/// `best` is the latest on-time candidate seen so far (`None` until one turns up). Late
/// candidates never enter the accumulator. A strictly later on-time candidate displaces
/// `best`; an earlier or equally stamped one is dropped, so ties keep the first seen.
pub fn reduce_step(
    best: Option<CandidateSubmission>,
    candidate: CandidateSubmission,
) -> (Option<CandidateSubmission>, Option<Discard>) {
    if candidate.late {
        let discard = Discard {
            candidate,
            disposition: Disposition::LateExcluded,
        };
        return (best, Some(discard));
    }

    match best {
        None => (Some(candidate), None),
        Some(current) if candidate.submitted_at > current.submitted_at => {
            let discard = Discard {
                candidate: current,
                disposition: Disposition::Superseded,
            };
            (Some(candidate), Some(discard))
        }
        Some(current) => {
            let discard = Discard {
                candidate,
                disposition: Disposition::Superseded,
            };
            (Some(current), Some(discard))
        }
    }
}

/// Fold a whole group, returning the winner and every discard in encounter order.
pub fn reduce(group: &[CandidateSubmission]) -> (Option<CandidateSubmission>, Vec<Discard>) {
    group
        .iter()
        .cloned()
        .fold((None, Vec::new()), |(best, mut discards), candidate| {
            let (best, discard) = reduce_step(best, candidate);
            discards.extend(discard);
            (best, discards)
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadReason {
    NoOnTimeSubmission,
    FileCount(usize),
    FiletypeError(String),
}

impl BadReason {
    pub fn describe(&self) -> String {
        match self {
            BadReason::NoOnTimeSubmission => "no on-time submission".to_string(),
            BadReason::FileCount(count) => format!("{count} files submitted"),
            BadReason::FiletypeError(error) => error.clone(),
        }
    }
}

/// A single file to move into the output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub record: SubmissionRecord,
    pub from: PathBuf,
    pub to: PathBuf,
    /// Receipt to delete once the move has gone through.
    pub receipt: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(Relocation),
    /// Left for manual handling. When every candidate was late, `record` describes the
    /// first one, whose files are already in the cleanup list and will be gone from the
    /// Learn folder by the time the report is read.
    Bad {
        record: SubmissionRecord,
        reason: BadReason,
    },
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentPlan {
    pub student: StudentRecord,
    pub verdict: Verdict,
    /// Audit entries for superseded and late candidates, in encounter order.
    pub discarded: Vec<SubmissionRecord>,
    /// Receipts and uploads of discarded candidates.
    pub cleanup: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentResult {
    pub outcome: Outcome,
    pub audit: Vec<SubmissionRecord>,
}

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    source_dir: PathBuf,
    output_dir: PathBuf,
}

impl SelectionEngine {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Plan a student, consulting `store` only for the manual fallback file.
    pub fn plan<S: FileStore>(
        &self,
        student: &StudentRecord,
        group: &[CandidateSubmission],
        store: &S,
    ) -> StudentPlan {
        let manual = if group.is_empty() {
            Some(self.source_dir.join(student.manual_file_name()))
                .filter(|path| store.exists(path))
        } else {
            None
        };
        self.select(student, group, manual.as_deref())
    }

    /// Decide what happens to one student's submissions.
    ///
    /// `manual_file` is only looked at when `group` is empty; pass it only if it exists.
    pub fn select(
        &self,
        student: &StudentRecord,
        group: &[CandidateSubmission],
        manual_file: Option<&Path>,
    ) -> StudentPlan {
        if group.is_empty() {
            let verdict = match manual_file {
                Some(path) => Verdict::Accept(self.manual_relocation(student, path)),
                None => Verdict::Missing,
            };
            return StudentPlan {
                student: student.clone(),
                verdict,
                discarded: Vec::new(),
                cleanup: Vec::new(),
            };
        }

        let (winner, discards) = reduce(group);
        for discard in &discards {
            debug!(
                student = %student.student_id,
                receipt = %discard.candidate.receipt_path.display(),
                disposition = discard.disposition.label(),
                "discarding submission"
            );
        }

        let keep: HashSet<&Path> = winner
            .iter()
            .flat_map(CandidateSubmission::owned_paths)
            .collect();
        let mut seen = HashSet::new();
        let cleanup = discards
            .iter()
            .flat_map(|discard| discard.candidate.owned_paths())
            .filter(|path| !keep.contains(path))
            .filter(|path| seen.insert(path.to_path_buf()))
            .map(Path::to_path_buf)
            .collect();
        let discarded = discards
            .iter()
            .map(|discard| discard.candidate.record(discard.disposition))
            .collect();

        let verdict = match winner {
            None => Verdict::Bad {
                record: group[0].record(Disposition::LateExcluded),
                reason: BadReason::NoOnTimeSubmission,
            },
            Some(winner) if winner.is_clean() => {
                Verdict::Accept(self.candidate_relocation(student, &winner))
            }
            Some(winner) => {
                let reason = match &winner.filetype_error {
                    Some(error) => BadReason::FiletypeError(error.clone()),
                    None => BadReason::FileCount(winner.payload_count()),
                };
                Verdict::Bad {
                    record: winner.record(Disposition::Bad),
                    reason,
                }
            }
        };

        StudentPlan {
            student: student.clone(),
            verdict,
            discarded,
            cleanup,
        }
    }

    fn candidate_relocation(
        &self,
        student: &StudentRecord,
        winner: &CandidateSubmission,
    ) -> Relocation {
        Relocation {
            record: winner.record(Disposition::ToMark),
            from: winner.payload_paths[0].clone(),
            to: self
                .output_dir
                .join(student.output_file_name(winner.timeliness())),
            receipt: Some(winner.receipt_path.clone()),
        }
    }

    fn manual_relocation(&self, student: &StudentRecord, path: &Path) -> Relocation {
        let mut record = SubmissionRecord::for_student(student, Disposition::Manual);
        record.late_submission = Timeliness::Manual.label().to_string();
        record.filename = student.manual_file_name();
        record.number_of_files = 1;
        Relocation {
            record,
            from: path.to_path_buf(),
            to: self
                .output_dir
                .join(student.output_file_name(Timeliness::Manual)),
            receipt: None,
        }
    }
}

/// Carry out a plan. File errors are logged and folded into the outcome; they never
/// abort the run.
pub fn execute<S: FileStore>(plan: StudentPlan, store: &S) -> StudentResult {
    let StudentPlan {
        student,
        verdict,
        discarded,
        cleanup,
    } = plan;

    for path in &cleanup {
        if let Err(err) = store.remove(path) {
            warn!(
                student = %student.student_id,
                path = %path.display(),
                error = %err,
                "could not remove discarded file"
            );
        }
    }

    let mut audit = discarded;
    let outcome = match verdict {
        Verdict::Missing => {
            info!(student = %student.student_id, "no submission");
            let record = SubmissionRecord::for_student(&student, Disposition::NoSubmission);
            audit.push(record.clone());
            Outcome::NoSubmission(record)
        }
        Verdict::Bad { record, reason } => {
            info!(
                student = %student.student_id,
                reason = %reason.describe(),
                "bad submission left for manual handling"
            );
            if reason != BadReason::NoOnTimeSubmission {
                audit.push(record.clone());
            }
            Outcome::BadSubmission(record)
        }
        Verdict::Accept(relocation) => {
            let Relocation {
                mut record,
                from,
                to,
                receipt,
            } = relocation;
            match store.relocate(&from, &to) {
                Ok(status) => {
                    info!(
                        student = %student.student_id,
                        to = %to.display(),
                        status = status.label(),
                        "filed submission"
                    );
                    record.output_file = status.label().to_string();
                    if let Some(receipt) = receipt {
                        if let Err(err) = store.remove(&receipt) {
                            warn!(
                                student = %student.student_id,
                                path = %receipt.display(),
                                error = %err,
                                "could not remove receipt after filing"
                            );
                        }
                    }
                    audit.push(record.clone());
                    Outcome::Accepted(record)
                }
                Err(err) => {
                    warn!(
                        student = %student.student_id,
                        from = %from.display(),
                        error = %err,
                        "could not file submission"
                    );
                    record.to_mark = Disposition::Bad.label().to_string();
                    record.output_file = err.to_string();
                    audit.push(record.clone());
                    Outcome::BadSubmission(record)
                }
            }
        }
    };

    StudentResult { outcome, audit }
}
