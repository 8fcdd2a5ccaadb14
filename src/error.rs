use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong between receiving a link and inserting the
/// track row. One variant per failure kind; nothing is downgraded or retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not extract a video ID from: {0}")]
    InvalidLink(String),

    #[error("no download link resolved for video {0}")]
    NoDownloadLink(String),

    #[error("{service} request failed: {message}")]
    Upstream { service: &'static str, message: String },

    #[error("downloaded payload rejected: {0}")]
    ContentValidation(String),

    #[error("classifier response unusable: {0}")]
    ClassifierParse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        PipelineError::Upstream {
            service,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Every failure kind is flattened into one 500 payload at the request
/// boundary; the variant only shows up in the message text.
impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        error!("request failed: {self}");
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
