//! Maps raw responses onto typed results or classified errors.

use chrono::{DateTime, Utc};
use reqwest::{
    StatusCode,
    header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::transport::RawResponse;
use crate::error::{ApiError, Result};

/// Longest slice of a response body quoted in an error message.
const MAX_MESSAGE_LEN: usize = 300;

/// Passes successful responses through and classifies everything else.
pub fn check_status(raw: RawResponse) -> Result<RawResponse> {
    let status = raw.status;
    if status.is_success() {
        return Ok(raw);
    }

    let message = error_message(&raw);

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { status, message },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation { status, message }
        }
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit {
            retry_after: parse_retry_after(&raw.headers),
            message,
        },
        s if s.is_server_error() => ApiError::Server { status, message },
        // Remaining 4xx, and 1xx/3xx that reqwest did not resolve itself.
        _ => ApiError::Client { status, message },
    };

    Err(error)
}

/// Decodes a JSON body into `T`.
pub fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<T> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::decoding(
            Some(raw.status),
            "expected a JSON body but the response was empty",
        ));
    }

    serde_json::from_slice(&raw.body).map_err(|e| {
        ApiError::decoding(
            Some(raw.status),
            format!("{} (body: {})", e, truncate(&raw.body_text(), MAX_MESSAGE_LEN)),
        )
    })
}

/// Best human-readable explanation of a failed response.
pub fn error_message(raw: &RawResponse) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&raw.body) {
        for key in ["detail", "message", "title", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                if !text.trim().is_empty() {
                    return truncate(text.trim(), MAX_MESSAGE_LEN);
                }
            }
        }
    }

    let text = raw.body_text();
    let text = text.trim();
    if !text.is_empty() {
        return truncate(text, MAX_MESSAGE_LEN);
    }

    raw.status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

/// Reads `Retry-After` as either delta-seconds or an HTTP-date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push('…');
        cut
    }
}
