use std::borrow::Cow;
use std::fmt::Display;

use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a structured error payload.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Transport-level failure (connection, TLS, timeout). Never retried here.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// A success response whose body did not decode into the target type.
    #[error("failed to decode response body: {reason}")]
    Decode { reason: String, body: String },
    /// The request could not be assembled in the first place.
    #[error("failed to build request: {0}")]
    Build(String),
}

impl Error {
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_type(&self, kind: ErrorType) -> bool {
        self.as_api().is_some_and(|err| err.is_type(kind))
    }

    pub fn is_code(&self, code: &ErrorCode) -> bool {
        self.as_api().is_some_and(|err| err.is_code(code))
    }
}

/// A decoded `{"errors": [...]}` payload, or a synthesized stand-in when the
/// body carried no recognizable errors array.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub request_id: Option<String>,
    errors: Vec<ErrorDetail>,
}

impl std::error::Error for ApiError {}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "duffel: {}", self.primary().message)
    }
}

impl ApiError {
    /// Decodes the error body for a non-2xx response. Always produces an
    /// error value; unrecognizable bodies yield the synthesized default.
    pub fn from_body(status: StatusCode, body: &str) -> ApiError {
        Self::from_error_body(status, body).unwrap_or_else(|| Self::synthesized(status))
    }

    /// Decodes the body only if it carries a non-empty `errors` array.
    pub(crate) fn from_error_body(status: StatusCode, body: &str) -> Option<ApiError> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        if parsed.errors.is_empty() {
            return None;
        }
        let meta = parsed.meta;
        // An errors array can arrive under a 2xx status; the body's own
        // meta.status is authoritative there.
        let status = match meta.as_ref().and_then(|meta| meta.status) {
            Some(reported) if status.is_success() => reported,
            _ => status,
        };
        Some(ApiError {
            status,
            request_id: meta.and_then(|meta| meta.request_id),
            errors: parsed.errors,
        })
    }

    fn synthesized(status: StatusCode) -> ApiError {
        ApiError {
            status,
            request_id: None,
            errors: vec![ErrorDetail {
                kind: ErrorType::UnknownError,
                code: ErrorCode::UNKNOWN,
                title: "Unknown error".to_string(),
                message: "An unknown error occurred".to_string(),
                source: None,
            }],
        }
    }

    /// The first error object drives classification; the rest are retained
    /// for display. `errors` is never empty.
    pub fn primary(&self) -> &ErrorDetail {
        &self.errors[0]
    }

    pub fn errors(&self) -> &[ErrorDetail] {
        &self.errors
    }

    pub fn is_type(&self, kind: ErrorType) -> bool {
        self.primary().kind == kind
    }

    pub fn is_code(&self, code: &ErrorCode) -> bool {
        self.primary().code == *code
    }
}

/// Coarse error category reported by the server in each error object's `type`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    AirlineError,
    ApiError,
    AuthenticationError,
    AuthorizationError,
    InvalidRequestError,
    InvalidStateError,
    RateLimitError,
    ValidationError,
    #[serde(other)]
    UnknownError,
}

/// Fine-grained machine-readable reason, e.g. `airline_unknown`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(Cow<'static, str>);

impl ErrorCode {
    pub const UNKNOWN: ErrorCode = ErrorCode::known("unknown");
    pub const AIRLINE_UNKNOWN: ErrorCode = ErrorCode::known("airline_unknown");
    pub const AIRLINE_INTERNAL: ErrorCode = ErrorCode::known("airline_internal");
    pub const ACCESS_TOKEN_NOT_FOUND: ErrorCode = ErrorCode::known("access_token_not_found");
    pub const EXPIRED: ErrorCode = ErrorCode::known("expired");
    pub const INSUFFICIENT_PERMISSIONS: ErrorCode = ErrorCode::known("insufficient_permissions");
    pub const INTERNAL_SERVER_ERROR: ErrorCode = ErrorCode::known("internal_server_error");
    pub const INVALID_CONTENT_TYPE: ErrorCode = ErrorCode::known("invalid_content_type");
    pub const INVALID_VERSION: ErrorCode = ErrorCode::known("invalid_version");
    pub const NOT_FOUND: ErrorCode = ErrorCode::known("not_found");
    pub const OFFER_NO_LONGER_AVAILABLE: ErrorCode = ErrorCode::known("offer_no_longer_available");
    pub const RATE_LIMIT_EXCEEDED: ErrorCode = ErrorCode::known("rate_limit_exceeded");
    pub const VALIDATION_REQUIRED: ErrorCode = ErrorCode::known("validation_required");

    const fn known(code: &'static str) -> ErrorCode {
        ErrorCode(Cow::Borrowed(code))
    }

    pub fn new(code: impl Into<String>) -> ErrorCode {
        ErrorCode(Cow::Owned(code.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One object from the `errors` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: ErrorType,
    pub code: ErrorCode,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

/// Field-level detail attached to validation errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub pointer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    #[serde(default)]
    meta: Option<ErrorMeta>,
}

#[derive(Clone, Debug, Deserialize)]
struct ErrorMeta {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default, with = "http_serde::option::status_code")]
    status: Option<StatusCode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIRLINE_ERROR: &str = r#"{
        "meta": {"status": 400, "request_id": "FnDoZImpJwrA8mgZAAcC"},
        "errors": [{
            "type": "airline_error",
            "code": "airline_unknown",
            "title": "Airline error",
            "message": "The airline responded with an unexpected error, please contact support"
        }]
    }"#;

    #[test]
    fn decodes_airline_error() {
        let err = ApiError::from_body(StatusCode::BAD_REQUEST, AIRLINE_ERROR);
        assert!(err.is_type(ErrorType::AirlineError));
        assert!(err.is_code(&ErrorCode::AIRLINE_UNKNOWN));
        assert!(!err.is_type(ErrorType::ValidationError));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.request_id.as_deref(), Some("FnDoZImpJwrA8mgZAAcC"));
        assert_eq!(
            err.to_string(),
            "duffel: The airline responded with an unexpected error, please contact support"
        );
    }

    #[test]
    fn decoding_is_idempotent() {
        let first = ApiError::from_body(StatusCode::BAD_REQUEST, AIRLINE_ERROR);
        let second = ApiError::from_body(StatusCode::BAD_REQUEST, AIRLINE_ERROR);
        assert_eq!(first, second);
    }

    #[test]
    fn synthesizes_for_unrecognizable_body() {
        let err = ApiError::from_body(StatusCode::SERVICE_UNAVAILABLE, "<html>nope</html>");
        assert!(err.is_type(ErrorType::UnknownError));
        assert!(err.is_code(&ErrorCode::UNKNOWN));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "duffel: An unknown error occurred");
    }

    #[test]
    fn meta_status_wins_when_transport_says_success() {
        let err = ApiError::from_body(StatusCode::OK, AIRLINE_ERROR);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        // A genuine error status is never overridden by the body.
        let err = ApiError::from_body(StatusCode::UNPROCESSABLE_ENTITY, AIRLINE_ERROR);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn synthesizes_for_empty_errors_array() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, r#"{"errors": []}"#);
        assert!(err.is_type(ErrorType::UnknownError));
    }

    #[test]
    fn unmapped_type_falls_back_to_unknown() {
        let body = r#"{"errors": [{"type": "brand_new_error", "code": "mystery", "message": "?"}]}"#;
        let err = ApiError::from_body(StatusCode::IM_A_TEAPOT, body);
        assert!(err.is_type(ErrorType::UnknownError));
        assert!(err.is_code(&ErrorCode::new("mystery")));
    }

    #[test]
    fn first_error_is_primary_and_all_are_retained() {
        let body = r#"{"errors": [
            {"type": "validation_error", "code": "validation_required", "message": "origin is required",
             "source": {"field": "origin", "pointer": "/slices/0/origin"}},
            {"type": "validation_error", "code": "validation_required", "message": "destination is required"}
        ]}"#;
        let err = ApiError::from_body(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(err.is_type(ErrorType::ValidationError));
        assert_eq!(err.errors().len(), 2);
        assert_eq!(
            err.primary().source.as_ref().unwrap().field.as_deref(),
            Some("origin")
        );
    }

    #[test]
    fn classification_on_wrapped_error() {
        let err = Error::from(ApiError::from_body(StatusCode::BAD_REQUEST, AIRLINE_ERROR));
        assert!(err.is_type(ErrorType::AirlineError));
        assert!(err.is_code(&ErrorCode::AIRLINE_UNKNOWN));
        assert!(err.as_api().is_some());
    }
}
