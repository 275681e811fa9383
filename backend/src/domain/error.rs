//! Domain-level error type.
//!
//! Errors are transport agnostic. The HTTP adapter maps [`ErrorCode`] to a
//! status code and redacts internal messages before they reach a caller; the
//! full message stays in server-side logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Response header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Stable machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed, e.g. bad pagination input.
    InvalidRequest,
    /// The caller may not act on the resource: wrong owner, unpaid order or
    /// throttled access.
    Unauthorized,
    /// The requested resource does not exist.
    NotFound,
    /// A store, signing or catalogue failure occurred.
    InternalError,
}

impl ErrorCode {
    /// Message used when a caller supplies a blank one.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid request",
            Self::Unauthorized => "Not Authorized",
            Self::NotFound => "Not found",
            Self::InternalError => "Internal server error",
        }
    }
}

/// Reasons a decoded error payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
    #[error("trace identifier {value:?} is not a UUID")]
    MalformedTraceId { value: String },
}

/// Domain error payload.
///
/// Constructors never fail: a blank message is replaced by the code's
/// [`ErrorCode::fallback_message`]. The trace identifier in scope, if any, is
/// captured at construction.
///
/// # Examples
/// ```
/// use backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("download not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "download not found");
/// assert_eq!(Error::unauthorized("  ").message(), "Not Authorized");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorPayload", into = "ErrorPayload")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    trace_id: Option<TraceId>,
    details: Option<Value>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Identifier correlating this error with request logs.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach structured details.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad offset").with_details(json!({ "field": "offset" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

/// Wire form of [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorPayload {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id.map(|id| id.to_string()),
            details: value.details,
        }
    }
}

impl TryFrom<ErrorPayload> for Error {
    type Error = ErrorValidationError;

    fn try_from(payload: ErrorPayload) -> Result<Self, Self::Error> {
        if payload.message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        // A decoded payload carries its own trace id; the ambient one is ignored.
        let trace_id = payload
            .trace_id
            .map(|raw| {
                raw.parse::<TraceId>()
                    .map_err(|_| ErrorValidationError::MalformedTraceId { value: raw })
            })
            .transpose()?;
        Ok(Self {
            code: payload.code,
            message: payload.message,
            trace_id,
            details: payload.details,
        })
    }
}
