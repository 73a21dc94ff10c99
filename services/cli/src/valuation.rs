use crate::cli::{CalculateArgs, OutputFormat, ValidateArgs};
use crate::form::load_form;
use property_valuation::config::AppConfig;
use property_valuation::error::AppError;
use property_valuation::telemetry;
use property_valuation::workflows::valuation::{
    map_request, HttpValuationApi, InsightAttempt, ValuationForm, ValuationOrchestrator,
    ValuationReport,
};
use std::process::ExitCode;

/// Print the request or the violations; invalid forms exit with a failure status.
pub(crate) fn run_validate(args: ValidateArgs) -> Result<ExitCode, AppError> {
    let form = load_form(&args.form)?;
    let (output, valid) = render_validation(&form)?;
    println!("{output}");
    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render_validation(form: &ValuationForm) -> Result<(String, bool), AppError> {
    match form.validate() {
        Ok(validated) => {
            let request = map_request(&validated);
            Ok((serde_json::to_string_pretty(&request)?, true))
        }
        Err(report) => {
            let mut output = format!("Form has {} problem(s):", report.violations.len());
            for violation in &report.violations {
                output.push_str(&format!("\n  - {violation}"));
            }
            Ok((output, false))
        }
    }
}

pub(crate) async fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let CalculateArgs {
        form,
        analyze,
        format,
        base_url,
        timeout_secs,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(base_url) = base_url {
        config.api.set_base_url(&base_url)?;
    }
    if let Some(secs) = timeout_secs {
        config.api.set_timeout_secs(secs)?;
    }
    telemetry::init(&config.telemetry)?;
    tracing::debug!(
        environment = ?config.environment,
        base_url = %config.api.base_url,
        "configuration loaded"
    );

    let form = load_form(&form)?;
    let api = HttpValuationApi::new(&config.api)?;
    let orchestrator = ValuationOrchestrator::new(api);

    orchestrator.submit(&form).await?;
    if analyze {
        if let InsightAttempt::Skipped(reason) = orchestrator.generate_insight().await {
            tracing::warn!(?reason, "insight request skipped");
        }
    }

    let Some(report) = ValuationReport::from_snapshot(&orchestrator.snapshot()) else {
        return Ok(());
    };
    match format {
        OutputFormat::Text => println!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
