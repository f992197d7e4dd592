use std::time::Duration;

use axum::http::StatusCode;

/// Message returned to the client when no usable input text was supplied.
pub const MISSING_INPUT_MESSAGE: &str = "Please send text or URL";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please send text or URL")]
    ValidationError,

    #[error("Failed to fetch content: {0}")]
    FetchError(#[from] FetchError),

    #[error("Summarization failed: {0}")]
    SummarizationError(#[from] SummarizationError),

    #[error("Failed to render document: {0}")]
    RenderError(#[from] RenderError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request processing timed out after {0:?}")]
    Timeout(Duration),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors raised while retrieving remote content.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("response is not text (content type {0})")]
    NonText(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

/// Errors raised by the summarization provider call.
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("provider request failed")]
    Request(#[source] reqwest::Error),

    #[error("provider request timed out")]
    Timeout,

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response format from provider: {0}")]
    MalformedResponse(String),
}

impl SummarizationError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SummarizationError::Timeout
        } else {
            SummarizationError::Request(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to encode page content: {0}")]
    Encode(String),

    #[error("failed to write document: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_the_only_client_error() {
        assert_eq!(AppError::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(FetchError::Status(404)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(SummarizationError::Timeout).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(RenderError::Write("disk".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Timeout(Duration::from_secs(1)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_include_the_failing_stage() {
        assert_eq!(AppError::ValidationError.to_string(), "Please send text or URL");
        assert_eq!(
            AppError::from(FetchError::Status(502)).to_string(),
            "Failed to fetch content: server responded with status 502"
        );
        let err = AppError::from(SummarizationError::Api {
            status: 401,
            message: "Incorrect API key provided".into(),
        });
        assert_eq!(
            err.to_string(),
            "Summarization failed: provider returned status 401: Incorrect API key provided"
        );
    }
}
