use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use thiserror::Error;

use crate::agent::record::FallbackReason;

/// Failure reported by the external text-generation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rate limited by text-generation service")]
    RateLimited,
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request to text-generation service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed service response: {0}")]
    Malformed(String),
}

/// Why the dispatcher gave up on the service.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error(transparent)]
    Service(ServiceError),
    #[error("dispatch cancelled")]
    Cancelled,
    #[error("dispatch timed out after {0:?}")]
    TimedOut(Duration),
}

impl DispatchError {
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            DispatchError::RateLimitExhausted { .. } => FallbackReason::RateLimitExhausted,
            DispatchError::Service(_) => FallbackReason::DispatchFailure,
            DispatchError::Cancelled => FallbackReason::Cancelled,
            DispatchError::TimedOut(_) => FallbackReason::TimedOut,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("candidate is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("candidate JSON is not an object")]
    NotAnObject,
    #[error("field '{0}' must be a string, got an object or array")]
    NonScalarField(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured; set llm_config.llm_api_key or the API_KEY environment variable")]
    MissingApiKey,
    #[error("could not find config file, tried: {0:?}")]
    NotFound(Vec<String>),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Layered(#[from] config::ConfigError),
    #[error("unsupported LLM provider: {0}")]
    UnsupportedProvider(String),
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read vocabulary file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML vocabulary: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON vocabulary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid vocabulary: {0}")]
    Invalid(String),
}

/// Errors surfaced by the HTTP layer. The pipeline itself never fails;
/// these only cover session bookkeeping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session limit of {0} reached")]
    SessionLimit(usize),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SessionLimit(_) => StatusCode::TOO_MANY_REQUESTS,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
