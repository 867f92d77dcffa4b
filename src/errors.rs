use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::dispatcher::DispatchError;

/// Main error type for the push gateway
#[derive(Debug)]
pub enum GatewayError {
    // Request errors
    MissingRequiredField(String),

    // Dispatch errors
    Dispatch(DispatchError),

    // Serialization and parsing errors
    JsonParsing(String),

    // Configuration and setup errors
    ConfigurationError(String),
    InvalidConfiguration { variable: String, reason: String },
}

/// Error body of the callable protocol: `{"error": {"status", "message"}}`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CallableErrorResponse {
    pub error: CallableErrorBody,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CallableErrorBody {
    pub status: String,
    pub message: String,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MissingRequiredField(field) => write!(f, "Missing required field: {}", field),

            GatewayError::Dispatch(err) => write!(f, "{}", err),

            GatewayError::JsonParsing(msg) => write!(f, "Request body is not valid JSON: {}", msg),

            GatewayError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            GatewayError::InvalidConfiguration { variable, reason } => {
                write!(f, "Invalid value for {}: {}", variable, reason)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Callable-protocol status code for this error.
    pub fn callable_status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::MissingRequiredField(_) | GatewayError::JsonParsing(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = self.callable_status();
        let message = match &self {
            GatewayError::Dispatch(err) => err.to_string(),
            GatewayError::MissingRequiredField(_) | GatewayError::JsonParsing(_) => self.to_string(),
            // Internal detail stays in the logs
            _ => "Internal error".to_string(),
        };

        let body = CallableErrorResponse {
            error: CallableErrorBody {
                status: code.to_string(),
                message,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

// Convenience type alias for Results
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        GatewayError::Dispatch(err)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::JsonParsing(err.to_string())
    }
}

// Helper functions for creating common errors
impl GatewayError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        GatewayError::ConfigurationError(msg.into())
    }

    pub fn invalid_configuration(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::InvalidConfiguration {
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}
