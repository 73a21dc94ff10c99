use serde_json::Value;

pub const UNREACHABLE_MESSAGE: &str = "Cannot reach server. Please check your connection.";
pub const CLIENT_FAULT_MESSAGE: &str = "Invalid request. Please check your input.";
pub const SERVER_FAULT_MESSAGE: &str = "Server error occurred. Please try again later.";
pub const CALCULATION_FALLBACK_MESSAGE: &str = "Request failed. Please try again.";
pub const ANALYSIS_FALLBACK_MESSAGE: &str = "Analysis request failed. Please try again.";

/// Which outbound call failed; only the generic fallback text differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Calculation,
    Analysis,
}

impl CallKind {
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Calculation => CALCULATION_FALLBACK_MESSAGE,
            Self::Analysis => ANALYSIS_FALLBACK_MESSAGE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Calculation => "calculation",
            Self::Analysis => "analysis",
        }
    }
}

/// Body attached to a failed response.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureBody {
    Text(String),
    Structured(Value),
}

impl FailureBody {
    /// Interpret a raw response body: a JSON string is literal text, a JSON object is structured,
    /// anything else (including bare numbers or booleans) stays raw text.
    pub fn from_raw(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(text)) => Some(Self::Text(text)),
            Ok(value @ Value::Object(_)) => Some(Self::Structured(value)),
            _ => Some(Self::Text(raw.to_string())),
        }
    }

    /// Server-supplied message: literal text first, then a structured `message` field.
    pub fn server_message(&self) -> Option<&str> {
        let candidate = match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Structured(value) => value.get("message").and_then(Value::as_str),
        };
        candidate.filter(|message| !message.is_empty())
    }
}

/// Outcome of a call that did not produce a usable success payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFailure {
    pub unreachable: bool,
    pub status: u16,
    pub body: Option<FailureBody>,
    /// Transport or decode detail for logs; never shown to the user.
    pub detail: Option<String>,
}

impl CallFailure {
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            unreachable: true,
            status: 0,
            body: None,
            detail: Some(detail.into()),
        }
    }

    pub fn status(status: u16, body: Option<FailureBody>) -> Self {
        Self {
            unreachable: false,
            status,
            body,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    TransportUnreachable,
    ClientFault,
    ServerFault,
    UnknownFault,
}

impl ErrorCategory {
    pub fn of(failure: &CallFailure) -> Self {
        match failure.status {
            _ if failure.unreachable => Self::TransportUnreachable,
            400..=499 => Self::ClientFault,
            500..=u16::MAX => Self::ServerFault,
            _ => Self::UnknownFault,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TransportUnreachable => "transport_unreachable",
            Self::ClientFault => "client_fault",
            Self::ServerFault => "server_fault",
            Self::UnknownFault => "unknown_fault",
        }
    }
}

/// User-facing message derived from a failed call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

/// Map a failed call to the single message shown to the user.
pub fn classify(failure: &CallFailure, call: CallKind) -> ClassifiedError {
    let category = ErrorCategory::of(failure);
    let server_message = || {
        failure
            .body
            .as_ref()
            .and_then(FailureBody::server_message)
            .map(str::to_string)
    };

    let message = match category {
        ErrorCategory::TransportUnreachable => UNREACHABLE_MESSAGE.to_string(),
        ErrorCategory::ClientFault => {
            server_message().unwrap_or_else(|| CLIENT_FAULT_MESSAGE.to_string())
        }
        ErrorCategory::ServerFault => {
            server_message().unwrap_or_else(|| SERVER_FAULT_MESSAGE.to_string())
        }
        ErrorCategory::UnknownFault => call.fallback_message().to_string(),
    };

    ClassifiedError { category, message }
}
