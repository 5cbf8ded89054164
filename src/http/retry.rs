//! Outcome classification for a single attempt.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TransportFault;

use super::transport::RawResponse;

/// Default number of retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Parsed body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    /// Body was valid JSON (a blank body counts as `{}`)
    Json(Value),
    /// Body was not JSON; returned verbatim
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text),
            ApiResponse::Json(_) => None,
        }
    }

    /// Deserializes a JSON response into `T`.
    pub fn json<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        match self {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(text) => Err(anyhow::anyhow!(
                "expected a JSON response, got text: {}",
                text
            )),
        }
    }
}

/// Why an attempt failed.
#[derive(Debug)]
pub enum Failure {
    /// The server answered with a non-2xx status
    Status { status: u16, message: String },
    /// No status was received
    Transport(TransportFault),
}

/// Result of one attempt, before the retry decision.
#[derive(Debug)]
pub enum Outcome {
    Success(ApiResponse),
    Retryable(Failure),
    Fatal(Failure),
}

/// Whether a status signals a transient server-side condition.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Classifies one exchange. Depends only on the exchange itself, never on
/// how many attempts have been made.
pub fn classify(result: Result<RawResponse, TransportFault>) -> Outcome {
    match result {
        Err(fault) => Outcome::Retryable(Failure::Transport(fault)),
        Ok(RawResponse { status, body }) if (200..=299).contains(&status) => {
            Outcome::Success(parse_body(body))
        }
        Ok(RawResponse { status, body }) => {
            let failure = Failure::Status {
                status,
                message: error_message(&body),
            };
            if is_retryable_status(status) {
                Outcome::Retryable(failure)
            } else {
                Outcome::Fatal(failure)
            }
        }
    }
}

/// Parses a success body, falling back to raw text when it is not JSON.
pub fn parse_body(body: String) -> ApiResponse {
    if body.trim().is_empty() {
        return ApiResponse::Json(Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_str(&body) {
        Ok(value) => ApiResponse::Json(value),
        Err(_) => ApiResponse::Text(body),
    }
}

/// Message for a failed response: the body's `error` field when present,
/// otherwise the raw body text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(msg)) => msg.clone(),
            Some(Value::Null) | None => body.to_string(),
            Some(other) => other.to_string(),
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> Result<RawResponse, TransportFault> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_success_parses_json() {
        let outcome = classify(response(200, r#"{"a":1}"#));
        assert!(matches!(
            outcome,
            Outcome::Success(ApiResponse::Json(ref v)) if *v == json!({"a": 1})
        ));
    }

    #[test]
    fn test_success_empty_body_is_empty_object() {
        let outcome = classify(response(204, ""));
        assert!(matches!(
            outcome,
            Outcome::Success(ApiResponse::Json(ref v)) if *v == json!({})
        ));
        assert_eq!(parse_body("  \n".to_string()), ApiResponse::Json(json!({})));
    }

    #[test]
    fn test_success_non_json_falls_back_to_text() {
        let response = parse_body("plain".to_string());
        assert_eq!(response, ApiResponse::Text("plain".to_string()));
        assert_eq!(response.as_text(), Some("plain"));
        assert_eq!(response.as_json(), None);
    }

    #[test]
    fn test_success_json_array_is_structured() {
        assert_eq!(
            parse_body("[1,2]".to_string()),
            ApiResponse::Json(json!([1, 2]))
        );
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 599] {
            assert!(
                matches!(classify(response(status, "")), Outcome::Retryable(_)),
                "status {} should be retryable",
                status
            );
        }
    }

    #[test]
    fn test_fatal_statuses() {
        for status in [100, 301, 304, 400, 401, 403, 404, 422] {
            assert!(
                matches!(classify(response(status, "")), Outcome::Fatal(_)),
                "status {} should be fatal",
                status
            );
        }
    }

    #[test]
    fn test_transport_fault_is_retryable() {
        let outcome = classify(Err(TransportFault::Timeout("slow".to_string())));
        assert!(matches!(
            outcome,
            Outcome::Retryable(Failure::Transport(TransportFault::Timeout(_)))
        ));
    }

    #[test]
    fn test_fatal_carries_error_field() {
        match classify(response(404, r#"{"error":"not found"}"#)) {
            Outcome::Fatal(Failure::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_error_message_rules() {
        assert_eq!(error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
        assert_eq!(error_message(r#"{"error":{"code":7}}"#), r#"{"code":7}"#);
        assert_eq!(error_message("gateway down"), "gateway down");
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn test_json_helper() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct User {
            id: u32,
        }

        let user: User = ApiResponse::Json(json!({"id": 3})).json().unwrap();
        assert_eq!(user, User { id: 3 });
        assert!(ApiResponse::Text("x".to_string()).json::<User>().is_err());
    }

    #[test]
    fn test_serializes_untagged() {
        let json = serde_json::to_string(&ApiResponse::Json(json!({"ok": true}))).unwrap();
        assert_eq!(json, r#"{"ok":true}"#);
        let text = serde_json::to_string(&ApiResponse::Text("hi".to_string())).unwrap();
        assert_eq!(text, r#""hi""#);
    }
}
