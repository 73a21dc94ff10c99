//! Income-approach valuation workflow: form rules, request mapping, the outbound service calls,
//! failure classification, insight cleanup, and the session that ties them together.

pub mod classify;
pub mod client;
pub mod domain;
pub mod insight;
pub mod mapping;
pub mod orchestrator;
pub mod report;
pub mod rules;

#[cfg(test)]
mod tests;

pub use classify::{
    classify, CallFailure, CallKind, ClassifiedError, ErrorCategory, FailureBody,
};
pub use client::{ClientError, HttpValuationApi, ValuationApi};
pub use domain::{
    CpiReference, ManagementCosts, PropertyType, RawFormFields, UnknownPropertyType,
    ValuationResult,
};
pub use insight::{normalize, normalize_insight, NormalizedInsight};
pub use mapping::{map_request, ValuationRequest};
pub use orchestrator::{
    InsightAttempt, InsightSkip, InsightState, SessionPhase, SessionState, SubmissionSnapshot,
    SubmitError, ValuationOrchestrator, ValuationSession,
};
pub use report::ValuationReport;
pub use rules::{
    apply_property_type, Constraint, FieldEdit, FieldViolation, FormField, ResidentialUnitsRule,
    ValidatedForm, ValidationReport, ValuationForm, Violation,
};
