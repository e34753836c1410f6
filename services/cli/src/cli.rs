use crate::ingest::{run_ingest, IngestArgs};
use clap::Parser;
use exam_ingest::config::AppConfig;
use exam_ingest::error::AppError;
use exam_ingest::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "exam-ingest",
    about = "Match Learn exam submissions to the class list and file them under exam numbers",
    long_about = "Match Learn exam submissions to the class list and file them under exam numbers.\n\n\
Bad submissions are left in the learn folder. Replace their files with a single \
<uun>.pdf (e.g. s1234567.pdf) and run again to file them.\n\n\
Only one run may use a given learn/output folder pair at a time.",
    version
)]
pub(crate) struct Cli {
    /// Log each collected receipt and discarded attempt
    #[arg(short, long)]
    pub(crate) verbose: bool,
    #[command(flatten)]
    pub(crate) ingest: IngestArgs,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();
    config.telemetry.verbose = cli.verbose;
    telemetry::init(&config.telemetry)?;

    run_ingest(cli.ingest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_flags() {
        let cli = Cli::try_parse_from(["exam-ingest"]).expect("defaults parse");
        assert_eq!(cli.ingest.course, "MATH00000");
        assert_eq!(cli.ingest.learndir.to_string_lossy(), "learn_dir");
        assert_eq!(cli.ingest.outputdir.to_string_lossy(), "output_dir");
        assert_eq!(cli.ingest.deadline.to_string(), "2020-04-22 at 16:00");
        assert!(!cli.ingest.json);
        assert!(!cli.verbose);
    }

    #[test]
    fn rejects_malformed_deadline() {
        let error = Cli::try_parse_from(["exam-ingest", "--deadline", "22/04/2020 16:00"])
            .expect_err("bad deadline");
        assert!(error.to_string().contains("YYYY-MM-DD-HH-MM"));
    }

    #[test]
    fn accepts_all_flags() {
        let cli = Cli::try_parse_from([
            "exam-ingest",
            "--course",
            "MATH10069",
            "--classlist",
            "MATH10069_enrolment.csv",
            "--learndir",
            "MATH10069",
            "--outputdir",
            "MATH10069_examno",
            "--deadline",
            "2020-05-01-09-30",
            "--json",
            "-v",
        ])
        .expect("flags parse");

        assert_eq!(cli.ingest.course, "MATH10069");
        assert_eq!(
            cli.ingest.classlist.to_string_lossy(),
            "MATH10069_enrolment.csv"
        );
        assert_eq!(cli.ingest.deadline.to_string(), "2020-05-01 at 09:30");
        assert!(cli.ingest.json);
        assert!(cli.verbose);
    }
}
