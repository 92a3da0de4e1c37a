use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

pub type Result<T> = std::result::Result<T, BookingError>;

/// Error `code` the backend attaches to a 403 for users still on the waitlist.
pub const WAITLIST_CODE: &str = "waitlist";

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("request rejected ({status}): {message}")]
    Request { status: StatusCode, message: String },

    #[error("unauthorized: {0}")]
    Auth(String),

    #[error("waitlisted: {0}")]
    Waitlist(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("booking {booking_id} did not finish within {timeout:?}")]
    Timeout { booking_id: String, timeout: Duration },

    #[error("polling cancelled for booking {booking_id}")]
    Cancelled { booking_id: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("token provider error: {0}")]
    TokenProvider(String),

    #[error("unexpected response ({status}): {message}")]
    Unknown { status: StatusCode, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    code: Option<String>,
}

impl BookingError {
    /// Classifies a non-2xx response. `fallback` is used as the message when
    /// the body carries no `error` text.
    pub fn from_response(status: StatusCode, body: &[u8], fallback: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = parsed
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        match (status, parsed.code.as_deref()) {
            (StatusCode::UNAUTHORIZED, _) => BookingError::Auth(message),
            (StatusCode::NOT_FOUND, _) => BookingError::NotFound(message),
            (StatusCode::FORBIDDEN, Some(WAITLIST_CODE)) => BookingError::Waitlist(message),
            (_, None) | (_, Some(WAITLIST_CODE)) => BookingError::Request { status, message },
            (_, Some(code)) => BookingError::Unknown {
                status,
                message: format!("{message} (code: {code})"),
            },
        }
    }

    /// The confirm endpoint answers 404 for an unknown provider as well as
    /// an unknown booking. Only the latter is `NotFound`; a rejected
    /// provider is a `Request` error.
    pub fn into_confirm_error(self) -> Self {
        match self {
            BookingError::NotFound(message) if !message.to_lowercase().contains("booking") => {
                BookingError::Request {
                    status: StatusCode::NOT_FOUND,
                    message,
                }
            }
            other => other,
        }
    }

    /// Message text without the variant prefix, as reported by the server
    /// where there is one.
    pub fn message(&self) -> String {
        match self {
            BookingError::Config(m)
            | BookingError::InvalidRequest(m)
            | BookingError::Auth(m)
            | BookingError::Waitlist(m)
            | BookingError::NotFound(m)
            | BookingError::TokenProvider(m) => m.clone(),
            BookingError::Request { message, .. } | BookingError::Unknown { message, .. } => {
                message.clone()
            }
            BookingError::Timeout { .. } => "Booking request timed out".to_string(),
            BookingError::Cancelled { .. } => "Booking polling cancelled".to_string(),
            BookingError::Network(e) => e.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BookingError::Request { status, .. } | BookingError::Unknown { status, .. } => {
                Some(*status)
            }
            BookingError::Auth(_) => Some(StatusCode::UNAUTHORIZED),
            BookingError::Waitlist(_) => Some(StatusCode::FORBIDDEN),
            BookingError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            BookingError::Network(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: u16, body: &str) -> BookingError {
        BookingError::from_response(
            StatusCode::from_u16(status).unwrap(),
            body.as_bytes(),
            "Failed to get booking status",
        )
    }

    #[test]
    fn test_waitlist_403() {
        let err = classify(403, r#"{"error":"not allowed","code":"waitlist"}"#);
        match err {
            BookingError::Waitlist(msg) => assert_eq!(msg, "not allowed"),
            other => panic!("expected waitlist, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_403_is_request_error() {
        let err = classify(403, r#"{"error":"forbidden"}"#);
        assert!(matches!(err, BookingError::Request { status, .. } if status == StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_401_is_auth() {
        assert!(matches!(classify(401, r#"{"error":"Unauthorized"}"#), BookingError::Auth(_)));
    }

    #[test]
    fn test_404_is_not_found() {
        let err = classify(404, r#"{"error":"Booking not found"}"#);
        assert_eq!(err.message(), "Booking not found");
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[test]
    fn test_400_keeps_server_message() {
        let err = classify(400, r#"{"error":"unknown provider"}"#);
        match err {
            BookingError::Request { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "unknown provider");
            }
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_uses_fallback() {
        let err = classify(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message(), "Failed to get booking status");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_401_with_code_is_still_auth() {
        let err = classify(401, r#"{"error":"Unauthorized","code":"token_expired"}"#);
        assert!(matches!(err, BookingError::Auth(ref m) if m == "Unauthorized"));
    }

    #[test]
    fn test_404_with_code_is_still_not_found() {
        let err = classify(404, r#"{"error":"Booking not found","code":"gone"}"#);
        assert!(matches!(err, BookingError::NotFound(ref m) if m == "Booking not found"));
    }

    #[test]
    fn test_confirm_404_for_provider_is_request_error() {
        let err = BookingError::from_response(
            StatusCode::NOT_FOUND,
            br#"{"error":"Provider not found"}"#,
            "Failed to confirm booking",
        )
        .into_confirm_error();
        match err {
            BookingError::Request { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Provider not found");
            }
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[test]
    fn test_confirm_404_for_booking_stays_not_found() {
        let err = BookingError::from_response(
            StatusCode::NOT_FOUND,
            br#"{"error":"Booking not found"}"#,
            "Failed to confirm booking",
        )
        .into_confirm_error();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[test]
    fn test_unrecognized_code_is_unknown() {
        let err = classify(403, r#"{"error":"suspended","code":"banned"}"#);
        assert!(matches!(err, BookingError::Unknown { .. }));
        assert_eq!(err.message(), "suspended (code: banned)");
    }
}
