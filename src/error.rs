use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures in the model lifecycle: storage, training and loading.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No model artifact found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt model artifact at {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("Model is not loaded")]
    ModelNotLoaded,

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Training data error: {0}")]
    Dataset(String),

    #[error("Model still unavailable at {} after training", .0.display())]
    Unavailable(PathBuf),
}

impl ModelError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModelError::Storage { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModelError::CorruptArtifact { path: path.into(), reason: reason.into() }
    }
}

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Failures surfaced at the `/predict` request boundary.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input format: {0}")]
    InputFormat(String),

    #[error(transparent)]
    Internal(#[from] ModelError),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Validation(_) | RequestError::InputFormat(_) => StatusCode::BAD_REQUEST,
            RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client.
    pub fn public_message(&self) -> String {
        match self {
            RequestError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        if let RequestError::Internal(e) = &self {
            error!("Prediction error: {}", e);
        }

        (self.status(), Json(json!({
            "success": false,
            "error": self.public_message(),
        }))).into_response()
    }
}
