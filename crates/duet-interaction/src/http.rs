//! Shared HTTP plumbing for the endpoint clients.

use duet_core::{DuetError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Builds the client every endpoint shares, with one overall request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| DuetError::config(format!("Failed to build HTTP client: {err}")))
}

/// Joins a base URL such as `https://host/v1` with an endpoint path.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Maps a transport-level failure.
pub(crate) fn map_send_error(service: &str, err: reqwest::Error) -> DuetError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    DuetError::remote(service, format!("{kind}: {err}"))
}

/// Turns a non-success response into a [`DuetError::RemoteCall`].
pub(crate) async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(service, status, body))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefers the `{"error": {"message": ...}}` text when the body has one.
pub(crate) fn map_http_error(service: &str, status: StatusCode, body: String) -> DuetError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    DuetError::remote_status(service, status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://api.example.com/v1/", "/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("http://localhost:9000", "audio/speech"),
            "http://localhost:9000/audio/speech"
        );
    }

    #[test]
    fn test_map_http_error_extracts_message() {
        let err = map_http_error(
            "reply",
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#.to_string(),
        );
        assert_eq!(
            err,
            DuetError::RemoteCall {
                service: "reply".to_string(),
                status: Some(401),
                message: "status 401: Invalid API key".to_string(),
            }
        );
    }

    #[test]
    fn test_map_http_error_keeps_raw_body() {
        let err = map_http_error("analysis", StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(err.to_string().contains("upstream down"));
        assert!(err.is_remote());
    }
}
