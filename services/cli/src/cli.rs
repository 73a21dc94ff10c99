use crate::form::FormArgs;
use crate::valuation::{run_calculate, run_validate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use property_valuation::error::AppError;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "property-valuation",
    about = "Validate valuation forms and run income-approach valuations against the valuation service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the form rules and print the request that would be sent
    Validate(ValidateArgs),
    /// Submit the form to the valuation service and print the result
    Calculate(CalculateArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    pub(crate) form: FormArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    #[command(flatten)]
    pub(crate) form: FormArgs,
    /// Request an AI insight once the calculation succeeds
    #[arg(long)]
    pub(crate) analyze: bool,
    /// Output format for the valuation report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
    /// Override APP_API_BASE_URL
    #[arg(long)]
    pub(crate) base_url: Option<String>,
    /// Override APP_API_TIMEOUT_SECS
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) async fn run() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Calculate(args) => run_calculate(args).await.map(|()| ExitCode::SUCCESS),
    }
}
