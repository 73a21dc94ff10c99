use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::classify::{classify, CallFailure, CallKind, ClassifiedError};
use super::client::ValuationApi;
use super::domain::ValuationResult;
use super::insight::normalize_insight;
use super::mapping::{map_request, ValuationRequest};
use super::rules::{ValidationReport, ValuationForm};

/// Progress of the optional narrative analysis for the current result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InsightState {
    #[default]
    NotRequested,
    Analyzing,
    Ready(String),
    Failed(String),
}

/// Session state. An analysis can only exist alongside a result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    SubmitFailed {
        error: String,
    },
    Submitted {
        result: Arc<ValuationResult>,
        insight: InsightState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Submitting,
    Submitted,
    SubmitFailed,
    AnalyzingInsight,
    InsightReady,
    InsightFailed,
}

/// Flattened view of the session used by displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionSnapshot {
    pub is_submitting: bool,
    pub result: Option<Arc<ValuationResult>>,
    pub error_text: Option<String>,
    pub is_analyzing: bool,
    pub insight_text: Option<String>,
    pub insight_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSkip {
    NoResult,
    AlreadyAnalyzing,
}

/// What a call to [`ValuationOrchestrator::generate_insight`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum InsightAttempt {
    Skipped(InsightSkip),
    Ready(String),
    Failed(ClassifiedError),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationReport),
    #[error(transparent)]
    Call(#[from] ClassifiedError),
}

/// Session record plus the generation counter that tells stale completions apart.
///
/// Each calculation opens a new generation. Completions carrying an older generation are
/// discarded instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct ValuationSession {
    state: SessionState,
    generation: u64,
}

impl ValuationSession {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Submitting => SessionPhase::Submitting,
            SessionState::SubmitFailed { .. } => SessionPhase::SubmitFailed,
            SessionState::Submitted { insight, .. } => match insight {
                InsightState::NotRequested => SessionPhase::Submitted,
                InsightState::Analyzing => SessionPhase::AnalyzingInsight,
                InsightState::Ready(_) => SessionPhase::InsightReady,
                InsightState::Failed(_) => SessionPhase::InsightFailed,
            },
        }
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        match &self.state {
            SessionState::Idle => SubmissionSnapshot::default(),
            SessionState::Submitting => SubmissionSnapshot {
                is_submitting: true,
                ..SubmissionSnapshot::default()
            },
            SessionState::SubmitFailed { error } => SubmissionSnapshot {
                error_text: Some(error.clone()),
                ..SubmissionSnapshot::default()
            },
            SessionState::Submitted { result, insight } => SubmissionSnapshot {
                result: Some(Arc::clone(result)),
                is_analyzing: matches!(insight, InsightState::Analyzing),
                insight_text: match insight {
                    InsightState::Ready(text) => Some(text.clone()),
                    _ => None,
                },
                insight_error: match insight {
                    InsightState::Failed(error) => Some(error.clone()),
                    _ => None,
                },
                ..SubmissionSnapshot::default()
            },
        }
    }

    /// Start a calculation from any state, dropping the previous result and insight.
    pub fn begin_calculation(&mut self) -> u64 {
        self.generation += 1;
        self.state = SessionState::Submitting;
        self.generation
    }

    /// Apply a calculation outcome. Returns `false` when the outcome was stale and discarded.
    pub fn finish_calculation(
        &mut self,
        generation: u64,
        outcome: Result<Arc<ValuationResult>, ClassifiedError>,
    ) -> bool {
        if generation != self.generation || !matches!(self.state, SessionState::Submitting) {
            return false;
        }
        self.state = match outcome {
            Ok(result) => SessionState::Submitted {
                result,
                insight: InsightState::NotRequested,
            },
            Err(error) => SessionState::SubmitFailed {
                error: error.message,
            },
        };
        true
    }

    /// Leave `Submitting` for a calculation that will never report back.
    pub fn abandon_calculation(&mut self, generation: u64) {
        if generation == self.generation && matches!(self.state, SessionState::Submitting) {
            self.state = SessionState::Idle;
        }
    }

    /// Mark an analysis in flight, or say why none may start.
    pub fn begin_insight(&mut self) -> Result<(u64, Arc<ValuationResult>), InsightSkip> {
        match &mut self.state {
            SessionState::Submitted {
                insight: InsightState::Analyzing,
                ..
            } => Err(InsightSkip::AlreadyAnalyzing),
            SessionState::Submitted { result, insight } => {
                *insight = InsightState::Analyzing;
                Ok((self.generation, Arc::clone(result)))
            }
            _ => Err(InsightSkip::NoResult),
        }
    }

    pub fn finish_insight(
        &mut self,
        generation: u64,
        outcome: Result<String, ClassifiedError>,
    ) -> bool {
        match self.analyzing_insight(generation) {
            Some(insight) => {
                *insight = match outcome {
                    Ok(text) => InsightState::Ready(text),
                    Err(error) => InsightState::Failed(error.message),
                };
                true
            }
            None => false,
        }
    }

    pub fn abandon_insight(&mut self, generation: u64) {
        if let Some(insight) = self.analyzing_insight(generation) {
            *insight = InsightState::NotRequested;
        }
    }

    fn analyzing_insight(&mut self, generation: u64) -> Option<&mut InsightState> {
        if generation != self.generation {
            return None;
        }
        match &mut self.state {
            SessionState::Submitted { insight, .. } if matches!(insight, InsightState::Analyzing) => {
                Some(insight)
            }
            _ => None,
        }
    }
}

/// Drives the calculate-then-analyze workflow against a [`ValuationApi`].
///
/// The session lock is only ever held between awaits, never across one.
pub struct ValuationOrchestrator<A> {
    api: A,
    session: Mutex<ValuationSession>,
}

impl<A> ValuationOrchestrator<A>
where
    A: ValuationApi,
{
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: Mutex::new(ValuationSession::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        lock(&self.session).snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.session).phase()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.session).state().clone()
    }

    /// Validate locally, then calculate. An invalid form never reaches the service.
    pub async fn submit(&self, form: &ValuationForm) -> Result<Arc<ValuationResult>, SubmitError> {
        let validated = form.validate().inspect_err(|report| {
            debug!(violations = report.violations.len(), "form blocked locally");
        })?;
        let request = map_request(&validated);
        Ok(self.calculate(&request).await?)
    }

    pub async fn calculate(
        &self,
        request: &ValuationRequest,
    ) -> Result<Arc<ValuationResult>, ClassifiedError> {
        let generation = lock(&self.session).begin_calculation();
        let in_flight = InFlight::new(&self.session, generation, CallKind::Calculation);
        info!(generation, property_type = %request.property_type, "requesting valuation");

        let outcome = match self.api.calculate(request).await {
            Ok(result) => Ok(Arc::new(result)),
            Err(failure) => Err(classify_logged(&failure, CallKind::Calculation)),
        };

        let applied = in_flight.settle(|session| session.finish_calculation(generation, outcome.clone()));
        if applied {
            if outcome.is_ok() {
                info!(generation, "valuation calculated");
            }
        } else {
            debug!(generation, "discarding stale calculation outcome");
        }
        outcome
    }

    /// Request a narrative for the current result. A no-op without a result or while another
    /// analysis is outstanding.
    pub async fn generate_insight(&self) -> InsightAttempt {
        let (generation, result) = match lock(&self.session).begin_insight() {
            Ok(ticket) => ticket,
            Err(skip) => {
                debug!(?skip, "insight request ignored");
                return InsightAttempt::Skipped(skip);
            }
        };
        let in_flight = InFlight::new(&self.session, generation, CallKind::Analysis);
        info!(generation, "requesting valuation insight");

        let outcome = match self.api.analyze(&result).await {
            Ok(raw) => {
                let normalized = normalize_insight(&raw);
                if normalized.repaired_quotes {
                    warn!(generation, "insight text was not valid JSON; stripped outer quotes");
                }
                Ok(normalized.text)
            }
            Err(failure) => Err(classify_logged(&failure, CallKind::Analysis)),
        };

        let applied = in_flight.settle(|session| session.finish_insight(generation, outcome.clone()));
        if !applied {
            debug!(generation, "discarding stale insight outcome");
        }
        match outcome {
            Ok(text) => InsightAttempt::Ready(text),
            Err(error) => InsightAttempt::Failed(error),
        }
    }
}

fn classify_logged(failure: &CallFailure, call: CallKind) -> ClassifiedError {
    let classified = classify(failure, call);
    warn!(
        call = call.label(),
        category = classified.category.label(),
        status = failure.status,
        detail = failure.detail.as_deref().unwrap_or(""),
        "{} request failed",
        call.label()
    );
    classified
}

fn lock(session: &Mutex<ValuationSession>) -> MutexGuard<'_, ValuationSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag if the call's future is dropped before it settles.
struct InFlight<'a> {
    session: &'a Mutex<ValuationSession>,
    generation: u64,
    call: CallKind,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a Mutex<ValuationSession>, generation: u64, call: CallKind) -> Self {
        Self {
            session,
            generation,
            call,
            settled: false,
        }
    }

    fn settle(mut self, apply: impl FnOnce(&mut ValuationSession) -> bool) -> bool {
        self.settled = true;
        let mut session = lock(self.session);
        apply(&mut *session)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut session = lock(self.session);
        match self.call {
            CallKind::Calculation => session.abandon_calculation(self.generation),
            CallKind::Analysis => session.abandon_insight(self.generation),
        }
        debug!(generation = self.generation, call = self.call.label(), "in-flight call dropped");
    }
}
