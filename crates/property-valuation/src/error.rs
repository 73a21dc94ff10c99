use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::valuation::{ClassifiedError, ClientError, SubmitError, ValidationReport};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Client(ClientError),
    Validation(ValidationReport),
    Call(ClassifiedError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Json(err) => write!(f, "invalid json: {}", err),
            AppError::Client(err) => write!(f, "client error: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::Call(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Call(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ClientError> for AppError {
    fn from(value: ClientError) -> Self {
        Self::Client(value)
    }
}

impl From<ValidationReport> for AppError {
    fn from(value: ValidationReport) -> Self {
        Self::Validation(value)
    }
}

impl From<ClassifiedError> for AppError {
    fn from(value: ClassifiedError) -> Self {
        Self::Call(value)
    }
}

impl From<SubmitError> for AppError {
    fn from(value: SubmitError) -> Self {
        match value {
            SubmitError::Validation(report) => Self::Validation(report),
            SubmitError::Call(err) => Self::Call(err),
        }
    }
}
