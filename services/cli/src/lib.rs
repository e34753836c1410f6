mod cli;
mod ingest;

use exam_ingest::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
