use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout;

use super::common::*;
use crate::workflows::valuation::classify::{
    CallFailure, ErrorCategory, FailureBody, SERVER_FAULT_MESSAGE, UNREACHABLE_MESSAGE,
};
use crate::workflows::valuation::mapping::map_request;
use crate::workflows::valuation::orchestrator::{
    InsightAttempt, InsightSkip, SessionPhase, SubmitError, ValuationOrchestrator,
};
use crate::workflows::valuation::rules::{FieldEdit, FormField, ValuationForm, Violation};
use crate::workflows::valuation::PropertyType;

const POLL_WINDOW: Duration = Duration::from_millis(20);

fn valid_form() -> ValuationForm {
    ValuationForm::new(form_fields())
}

#[tokio::test]
async fn calculate_then_insight_reaches_insight_ready() {
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()))
        .with_analysis(Scripted::ok(
            "\"Building share is moderate.\\nLand share dominates.\"".to_string(),
        ));
    let orchestrator = ValuationOrchestrator::new(api);

    let result = orchestrator
        .submit(&valid_form())
        .await
        .expect("calculation succeeds");
    assert_eq!(orchestrator.phase(), SessionPhase::Submitted);

    let attempt = orchestrator.generate_insight().await;
    assert_eq!(
        attempt,
        InsightAttempt::Ready("Building share is moderate.\nLand share dominates.".to_string())
    );

    let snapshot = orchestrator.snapshot();
    assert_eq!(orchestrator.phase(), SessionPhase::InsightReady);
    assert!(!snapshot.is_submitting);
    assert!(!snapshot.is_analyzing);
    assert_eq!(
        snapshot.insight_text.as_deref(),
        Some("Building share is moderate.\nLand share dominates.")
    );
    assert_eq!(orchestrator.api().analyzed(), vec![(*result).clone()]);

    let sent = orchestrator.api().sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].residential_units, Some(3.0));
}

#[tokio::test]
async fn failed_calculation_clears_submitting_and_result() {
    let api = ScriptedApi::default().with_calculation(Scripted::fail(CallFailure::status(503, None)));
    let orchestrator = ValuationOrchestrator::new(api);

    let err = orchestrator
        .submit(&valid_form())
        .await
        .expect_err("service is down");
    match err {
        SubmitError::Call(classified) => {
            assert_eq!(classified.category, ErrorCategory::ServerFault);
            assert_eq!(classified.message, SERVER_FAULT_MESSAGE);
        }
        other => panic!("expected classified call error, got {other:?}"),
    }

    let snapshot = orchestrator.snapshot();
    assert_eq!(orchestrator.phase(), SessionPhase::SubmitFailed);
    assert!(!snapshot.is_submitting);
    assert!(snapshot.result.is_none());
    assert_eq!(snapshot.error_text.as_deref(), Some(SERVER_FAULT_MESSAGE));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_service() {
    let orchestrator = ValuationOrchestrator::new(ScriptedApi::default());
    let form = valid_form().apply(FieldEdit::MonthlyNetColdRent(-1.0));

    match orchestrator.submit(&form).await {
        Err(SubmitError::Validation(report)) => assert_eq!(
            report.violation_for(FormField::MonthlyNetColdRent),
            Some(&Violation::MustBeGreaterThan(0.0))
        ),
        other => panic!("expected validation report, got {other:?}"),
    }

    assert_eq!(orchestrator.api().calculate_calls(), 0);
    let snapshot = orchestrator.snapshot();
    assert!(!snapshot.is_submitting);
    assert!(snapshot.result.is_none());
    assert!(snapshot.error_text.is_none());
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn commercial_submission_omits_units() {
    let api = ScriptedApi::default().with_calculation(Scripted::ok(sample_result()));
    let orchestrator = ValuationOrchestrator::new(api);
    let form = valid_form().apply(FieldEdit::PropertyType(PropertyType::Commercial));

    orchestrator.submit(&form).await.expect("calculation succeeds");

    let sent = orchestrator.api().sent_requests();
    assert_eq!(sent[0].property_type, PropertyType::Commercial);
    assert_eq!(sent[0].residential_units, None);
}

#[tokio::test]
async fn unreachable_service_reports_connectivity() {
    let api = ScriptedApi::default()
        .with_calculation(Scripted::fail(CallFailure::unreachable("connection refused")));
    let orchestrator = ValuationOrchestrator::new(api);

    let validated = valid_form().validate().expect("valid");
    let err = orchestrator
        .calculate(&map_request(&validated))
        .await
        .expect_err("unreachable");
    assert_eq!(err.message, UNREACHABLE_MESSAGE);
    assert_eq!(
        orchestrator.snapshot().error_text.as_deref(),
        Some(UNREACHABLE_MESSAGE)
    );
}

#[tokio::test]
async fn insight_without_result_is_ignored() {
    let orchestrator = ValuationOrchestrator::new(ScriptedApi::default());

    assert_eq!(
        orchestrator.generate_insight().await,
        InsightAttempt::Skipped(InsightSkip::NoResult)
    );
    assert_eq!(orchestrator.api().analyze_calls(), 0);
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn second_insight_request_while_in_flight_is_a_no_op() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()))
        .with_analysis(Scripted::ok("Yield is solid.".to_string()).gated(&gate))
        .with_analysis(Scripted::ok("never requested".to_string()));
    let orchestrator = ValuationOrchestrator::new(api);
    orchestrator.submit(&valid_form()).await.expect("calculation succeeds");

    let first = orchestrator.generate_insight();
    tokio::pin!(first);
    assert!(timeout(POLL_WINDOW, &mut first).await.is_err());
    assert_eq!(orchestrator.phase(), SessionPhase::AnalyzingInsight);
    assert!(orchestrator.snapshot().is_analyzing);

    assert_eq!(
        orchestrator.generate_insight().await,
        InsightAttempt::Skipped(InsightSkip::AlreadyAnalyzing)
    );

    gate.notify_one();
    assert_eq!(first.await, InsightAttempt::Ready("Yield is solid.".to_string()));
    assert_eq!(orchestrator.api().analyze_calls(), 1);
    assert_eq!(orchestrator.phase(), SessionPhase::InsightReady);
}

#[tokio::test]
async fn failed_insight_keeps_result_and_allows_retry() {
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()))
        .with_analysis(Scripted::fail(CallFailure::status(
            500,
            FailureBody::from_raw("AI analysis error: model overloaded"),
        )))
        .with_analysis(Scripted::ok("Retry worked.".to_string()));
    let orchestrator = ValuationOrchestrator::new(api);
    orchestrator.submit(&valid_form()).await.expect("calculation succeeds");

    match orchestrator.generate_insight().await {
        InsightAttempt::Failed(error) => {
            assert_eq!(error.message, "AI analysis error: model overloaded")
        }
        other => panic!("expected failed insight, got {other:?}"),
    }
    let snapshot = orchestrator.snapshot();
    assert_eq!(orchestrator.phase(), SessionPhase::InsightFailed);
    assert!(snapshot.result.is_some());
    assert!(!snapshot.is_analyzing);
    assert_eq!(
        snapshot.insight_error.as_deref(),
        Some("AI analysis error: model overloaded")
    );

    assert_eq!(
        orchestrator.generate_insight().await,
        InsightAttempt::Ready("Retry worked.".to_string())
    );
    let snapshot = orchestrator.snapshot();
    assert!(snapshot.insight_error.is_none());
    assert_eq!(snapshot.insight_text.as_deref(), Some("Retry worked."));
}

#[tokio::test]
async fn recalculating_discards_previous_insight() {
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()))
        .with_analysis(Scripted::ok("First insight.".to_string()))
        .with_calculation(Scripted::ok(result_with_multiplier(20.0)));
    let orchestrator = ValuationOrchestrator::new(api);

    orchestrator.submit(&valid_form()).await.expect("first calculation");
    orchestrator.generate_insight().await;
    assert_eq!(orchestrator.phase(), SessionPhase::InsightReady);

    let second = orchestrator.submit(&valid_form()).await.expect("second calculation");
    assert_eq!(second.multiplier, 20.0);
    let snapshot = orchestrator.snapshot();
    assert_eq!(orchestrator.phase(), SessionPhase::Submitted);
    assert!(snapshot.insight_text.is_none());
    assert!(snapshot.insight_error.is_none());
}

#[tokio::test]
async fn stale_calculation_completion_is_discarded() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(result_with_multiplier(11.0)).gated(&gate))
        .with_calculation(Scripted::ok(result_with_multiplier(22.0)));
    let orchestrator = ValuationOrchestrator::new(api);
    let form = valid_form();

    let first = orchestrator.submit(&form);
    tokio::pin!(first);
    assert!(timeout(POLL_WINDOW, &mut first).await.is_err());

    orchestrator.submit(&form).await.expect("second calculation");
    gate.notify_one();
    let stale = first.await.expect("first call still returns its own outcome");
    assert_eq!(stale.multiplier, 11.0);

    let snapshot = orchestrator.snapshot();
    let current = snapshot.result.expect("newest result kept");
    assert_eq!(current.multiplier, 22.0);
    assert!(!snapshot.is_submitting);
}

#[tokio::test]
async fn insight_for_superseded_result_is_discarded() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()))
        .with_analysis(Scripted::ok("About the old result.".to_string()).gated(&gate))
        .with_calculation(Scripted::ok(result_with_multiplier(30.0)));
    let orchestrator = ValuationOrchestrator::new(api);
    orchestrator.submit(&valid_form()).await.expect("first calculation");

    let insight = orchestrator.generate_insight();
    tokio::pin!(insight);
    assert!(timeout(POLL_WINDOW, &mut insight).await.is_err());

    orchestrator.submit(&valid_form()).await.expect("second calculation");
    assert!(!orchestrator.snapshot().is_analyzing);

    gate.notify_one();
    assert_eq!(
        insight.await,
        InsightAttempt::Ready("About the old result.".to_string())
    );
    let snapshot = orchestrator.snapshot();
    assert_eq!(orchestrator.phase(), SessionPhase::Submitted);
    assert!(snapshot.insight_text.is_none());
    assert_eq!(snapshot.result.expect("result present").multiplier, 30.0);
}

#[tokio::test]
async fn dropping_an_in_flight_calculation_leaves_submitting() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::default()
        .with_calculation(Scripted::ok(sample_result()).gated(&gate));
    let orchestrator = ValuationOrchestrator::new(api);

    let form = valid_form();
    let outcome = timeout(POLL_WINDOW, orchestrator.submit(&form)).await;
    assert!(outcome.is_err(), "call should still be pending");

    let snapshot = orchestrator.snapshot();
    assert!(!snapshot.is_submitting);
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
}
