use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to the browser.
///
/// Sanitizers and validators never produce these directly; they are raised at
/// the I/O boundary (filesystem, external APIs) or by request handlers that
/// turn a failed validator into a message naming the violated constraint.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },
    #[error("{message}")]
    Configuration {
        message: String,
        details: Option<String>,
    },
    #[error("{message}")]
    Api {
        message: String,
        details: Option<String>,
    },
    #[error("Output path escapes the outputs directory: {0}")]
    PathEscape(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn configuration(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn api(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Configuration { .. } => "configuration",
            Self::Api { .. } => "api",
            Self::PathEscape(_) => "path_escape",
            Self::NotFound(_) => "not_found",
            Self::Io(_) => "filesystem",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Configuration { .. } | Self::PathEscape(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Api { .. } => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Self::Validation { details, .. }
            | Self::Configuration { details, .. }
            | Self::Api { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Io(e) => tracing::error!("Filesystem error: {}", e),
            Self::PathEscape(path) => tracing::error!("Rejected write outside outputs: {}", path),
            Self::Api { message, details } => {
                tracing::error!("{}: {}", message, details.as_deref().unwrap_or(""))
            }
            _ => tracing::warn!("{} error: {}", self.kind(), self),
        }

        (
            status,
            Json(json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "details": self.details(),
            })),
        )
            .into_response()
    }
}
