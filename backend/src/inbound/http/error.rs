//! `ResponseError` for the domain [`Error`].
//!
//! Denials keep their message so the caller learns why access failed.
//! Internal failures are logged in full and answered with a fixed message,
//! no details and the trace id needed to find the log line.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

pub use crate::domain::ApiResult;
use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

const REDACTED_MESSAGE: &str = "Internal server error";

/// Body sent to the client for `error`.
fn public_body(error: &Error) -> Cow<'_, Error> {
    match error.code() {
        ErrorCode::InternalError => {
            tracing::error!(
                cause = error.message(),
                details = ?error.details(),
                trace_id = ?error.trace_id(),
                "request failed"
            );
            let mut redacted = Error::internal(REDACTED_MESSAGE);
            if let Some(id) = error.trace_id() {
                redacted = redacted.with_trace_id(id);
            }
            Cow::Owned(redacted)
        }
        _ => Cow::Borrowed(error),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_string()));
        }
        response.json(public_body(self).as_ref())
    }
}
