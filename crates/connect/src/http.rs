//! Shared response handling for the two API clients.

use log::debug;

use crate::error::{ConnectError, Result};
use crate::types::ApiErrorResponse;

const MAX_LOG_BODY_CHARS: usize = 512;

pub(crate) fn log_response(status: reqwest::StatusCode, body: &str) {
    if status.is_success() {
        debug!("API response status: {}", status);
        return;
    }

    let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    debug!("API response error ({}): {}", status, preview);
}

/// Parse a JSON response body.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    log_response(status, &body);

    if !status.is_success() {
        // Try to parse error response
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(ConnectError::api(
                status.as_u16(),
                format!("{}: {}", error.code, error.message),
            ));
        }
        return Err(ConnectError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        log::error!(
            "Failed to deserialize response. Body: {}, Error: {}",
            body,
            e
        );
        ConnectError::api(status.as_u16(), format!("Failed to parse response: {}", e))
    })
}
