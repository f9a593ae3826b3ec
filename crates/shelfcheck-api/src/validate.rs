//! Status, body and error-payload checks. Every check fails with
//! [`Error::AssertionFailed`].

use crate::client::HttpResponse;
use crate::{Error, Result};
use tracing::error;

fn fail<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::AssertionFailed(msg.into()))
}

/// Expected class of an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 400, 401 or 403 with an authentication indicator in the body.
    Authentication,
    /// 400 with a validation indicator in the body.
    Validation,
    NotFound,
    MethodNotAllowed,
    /// Checked like `General`.
    ServerError,
    /// Any status >= 400 with a non-empty JSON body.
    General,
}

const AUTH_INDICATORS: [&str; 5] = ["error", "unauthorized", "forbidden", "invalid", "authentication"];
const VALIDATION_INDICATORS: [&str; 4] = ["error", "invalid", "validation", "required"];

pub fn validate_status(expected: u16, response: &HttpResponse) -> Result<()> {
    if response.status != expected {
        return fail(format!(
            "unexpected status code: expected {}, got {}",
            expected, response.status
        ));
    }
    Ok(())
}

/// Check the status, then run `check` on the response.
pub fn validate_response<F>(expected: u16, response: &HttpResponse, check: F) -> Result<()>
where
    F: FnOnce(&HttpResponse) -> Result<()>,
{
    let result = validate_status(expected, response).and_then(|_| check(response));
    if let Err(ref e) = result {
        error!("Response validation failed: {}", e);
    }
    result
}

pub fn validate_field_exists(response: &HttpResponse, field: &str) -> Result<()> {
    if response.field(field).is_none() {
        return fail(format!("field '{}' not found in response", field));
    }
    Ok(())
}

pub fn validate_json(response: &HttpResponse) -> Result<()> {
    if let Err(e) = response.json() {
        return fail(format!("response is not valid JSON: {}", e));
    }
    Ok(())
}

/// Status >= 400 with a non-empty JSON body.
pub fn validate_error_format(response: &HttpResponse) -> Result<()> {
    if response.status < 400 {
        return fail(format!(
            "expected an error status (>= 400), got {}",
            response.status
        ));
    }
    if response.body.trim().is_empty() {
        return fail("error response body is empty");
    }
    validate_json(response)
}

fn body_mentions(response: &HttpResponse, words: &[&str]) -> bool {
    let body = response.body.to_lowercase();
    words.iter().any(|w| body.contains(w))
}

pub fn validate_error_response(response: &HttpResponse, kind: ErrorKind) -> Result<()> {
    let status = response.status;
    match kind {
        ErrorKind::Authentication => {
            if !matches!(status, 400 | 401 | 403) {
                return fail(format!("expected status 400, 401 or 403, got {}", status));
            }
            if !body_mentions(response, &AUTH_INDICATORS) {
                return fail("response carries no authentication error indicator");
            }
            Ok(())
        }
        ErrorKind::Validation => {
            validate_status(400, response)?;
            if !body_mentions(response, &VALIDATION_INDICATORS) {
                return fail("response carries no validation error indicator");
            }
            Ok(())
        }
        ErrorKind::NotFound => validate_status(404, response),
        ErrorKind::MethodNotAllowed => validate_status(405, response),
        ErrorKind::ServerError | ErrorKind::General => validate_error_format(response),
    }
}

/// The string at `field` is present, non-empty and, when `expected` is
/// given, contains it (case-insensitive).
pub fn validate_error_message(
    response: &HttpResponse,
    field: &str,
    expected: Option<&str>,
) -> Result<()> {
    let Some(message) = response.string_field(field) else {
        return fail(format!("error message '{}' is missing", field));
    };
    if message.is_empty() {
        return fail(format!("error message '{}' is empty", field));
    }
    if let Some(expected) = expected.filter(|e| !e.is_empty()) {
        if !message.to_lowercase().contains(&expected.to_lowercase()) {
            return fail(format!(
                "error message '{}' should contain '{}'",
                message, expected
            ));
        }
    }
    Ok(())
}
