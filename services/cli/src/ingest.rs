use clap::Args;
use exam_ingest::config::IngestConfig;
use exam_ingest::error::AppError;
use exam_ingest::workflows::ingest::{Deadline, IngestPipeline, RunSummary};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct IngestArgs {
    /// Course code, used to label the report files
    #[arg(long, default_value = "MATH00000")]
    pub(crate) course: String,
    /// CSV with columns UUN, Exam Number, Extra Time (minutes)
    #[arg(long, default_value = "MATH00000_enrolment.csv")]
    pub(crate) classlist: PathBuf,
    /// Folder holding the unzipped Learn download
    #[arg(long, default_value = "learn_dir")]
    pub(crate) learndir: PathBuf,
    /// Folder the anonymised scripts and reports are written to
    #[arg(long, default_value = "output_dir")]
    pub(crate) outputdir: PathBuf,
    /// Submission deadline (YYYY-MM-DD-HH-MM); the whole minute counts as on time
    #[arg(long, default_value = "2020-04-22-16-00", value_parser = parse_deadline)]
    pub(crate) deadline: Deadline,
    /// Print the run summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_deadline(raw: &str) -> Result<Deadline, String> {
    Deadline::parse(raw).map_err(|err| err.to_string())
}

impl IngestArgs {
    fn into_config(self) -> (IngestConfig, bool) {
        let config = IngestConfig {
            course_code: self.course,
            roster_path: self.classlist,
            source_dir: self.learndir,
            output_dir: self.outputdir,
            deadline: self.deadline,
        };
        (config, self.json)
    }
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let (config, json) = args.into_config();
    info!(course = %config.course_code, "ingest requested");

    let summary = IngestPipeline::new(config).run()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &summary).map_err(std::io::Error::from)?;
        writeln!(out)?;
    } else {
        render_summary(&mut out, &summary)?;
    }
    Ok(())
}

fn render_summary<W: Write>(out: &mut W, summary: &RunSummary) -> std::io::Result<()> {
    writeln!(out, "Course: {}", summary.course_code)?;
    writeln!(out, "Deadline: {}", summary.deadline)?;
    writeln!(out, "Class list contains {} students", summary.students)?;
    writeln!(
        out,
        "Learn receipts: {} from {} students",
        summary.receipts_scanned, summary.students_with_receipts
    )?;

    writeln!(out, "\nSuccessful submissions: {}", summary.accepted.len())?;
    writeln!(out, "Bad submissions: {}", summary.bad.len())?;
    for record in &summary.bad {
        let detail = if record.filetype_error.is_empty() {
            format!("{} files", record.number_of_files)
        } else {
            record.filetype_error.clone()
        };
        writeln!(
            out,
            "- {} ({}): {} [{}]",
            record.student_id, record.exam_number, detail, record.to_mark
        )?;
    }
    writeln!(out, "No submissions: {}", summary.missing.len())?;

    if !summary.issues.is_empty() {
        writeln!(out, "\nSkipped files")?;
        for issue in &summary.issues {
            writeln!(out, "- {}", issue.describe())?;
        }
    }

    writeln!(out, "\nReports")?;
    for path in [
        &summary.reports.success,
        &summary.reports.errors,
        &summary.reports.no_submission,
        &summary.reports.submission_summary,
    ] {
        writeln!(out, "- {}", path.display())?;
    }
    Ok(())
}
