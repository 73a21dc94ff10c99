mod cli;
mod form;
mod valuation;

use property_valuation::error::AppError;
use std::process::ExitCode;

/// Run the command line; `Ok` carries the exit status for outcomes that are not errors.
pub async fn run() -> Result<ExitCode, AppError> {
    cli::run().await
}
