//! Shared error handling for remote clients.
//!
//! Both the catalog and the data service report failures as an HTTP status plus
//! a JSON body whose shape differs per service. [`ApiError`] normalizes those
//! into one structure and decides how they become a [`ReelError`].

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ReelError;

/// Backend code the data service returns when a single-object select matched no rows
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Generic API error shared by every remote client.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, if available
    pub status: Option<StatusCode>,
    /// Service-specific error code (e.g. `PGRST116`)
    pub code: Option<String>,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    /// Human-readable error message
    pub message: String,
    /// Service name for context (e.g., "catalog", "data")
    pub provider: &'static str,
}

/// Union of the error body shapes the services send back
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    details: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    status_message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, provider: &'static str) -> Self {
        Self {
            status: None,
            code: None,
            retry_after: None,
            message: message.into(),
            provider,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Build an error from a non-success response, consuming its body.
    pub async fn from_response(response: reqwest::Response, provider: &'static str) -> Self {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let text = response.text().await.unwrap_or_default();

        let mut error = Self::from_body(status, &text, provider);
        error.retry_after = retry_after;
        error
    }

    /// Parse a response body into an error, falling back to the raw text
    pub fn from_body(status: StatusCode, body: &str, provider: &'static str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let message = parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .or(parsed.status_message)
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| format!("HTTP {status}"));
        let message = match parsed.details {
            Some(details) if !details.is_empty() => format!("{message} ({details})"),
            _ => message,
        };

        let code = parsed.code.map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        Self {
            status: Some(status),
            code,
            retry_after: None,
            message,
            provider,
        }
    }

    /// True when the backend reported "no rows" for a single-object select
    pub fn is_no_rows(&self) -> bool {
        self.code.as_deref() == Some(NO_ROWS_CODE)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status.is_some_and(|s| s == StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status
            .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }

    pub fn is_transient(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    /// Convert into a crate error:
    /// 1. rate limited -> `RateLimited`
    /// 2. unauthorized -> `Auth`
    /// 3. anything else -> `Api` with a formatted message
    pub fn to_reel_error(&self) -> ReelError {
        if self.is_rate_limited() {
            return ReelError::RateLimited(self.retry_after.unwrap_or(60));
        }
        if self.is_auth_failure() {
            return ReelError::Auth(format!("{} service: {}", self.provider, self.message));
        }

        match (&self.status, &self.code) {
            (Some(status), Some(code)) => ReelError::Api(format!(
                "{} API error ({} {}): {}",
                self.provider,
                status.as_u16(),
                code,
                self.message
            )),
            (Some(status), None) => ReelError::Api(format!(
                "{} API error ({}): {}",
                self.provider,
                status.as_u16(),
                self.message
            )),
            _ => ReelError::Api(format!("{} API error: {}", self.provider, self.message)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for ReelError {
    fn from(error: ApiError) -> Self {
        error.to_reel_error()
    }
}
