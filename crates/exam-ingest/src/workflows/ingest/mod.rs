//! Learn exam submission ingest: roster join, per-student selection and filing.

pub mod collector;
pub mod domain;
pub mod lateness;
pub mod pipeline;
pub mod receipt;
pub mod relocate;
pub mod report;
pub mod roster;
pub mod selection;

pub use collector::{collect, Collection, ScanIssue};
pub use domain::{
    CandidateSubmission, Disposition, Outcome, StudentRecord, SubmissionRecord, Timeliness,
};
pub use lateness::{Deadline, DeadlineError};
pub use pipeline::{IngestPipeline, RunSummary};
pub use receipt::{parse_receipt, ReceiptError, ReceiptRecord};
pub use relocate::{move_into, FileStore, LocalFileStore, MoveStatus, RelocationError};
pub use report::{ReportError, ReportKind, ReportPaths, ReportWriter};
pub use roster::{Roster, RosterError};
pub use selection::{
    execute, reduce, reduce_step, BadReason, Discard, Relocation, SelectionEngine, StudentPlan,
    StudentResult, Verdict,
};
