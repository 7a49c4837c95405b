use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::ErrorBody;

/// Fatal at startup: the process must not start serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Model file not found at {}", .path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Failed to load model: {source:#}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Artifact validation and inference failures inside the model runtime.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' expected {expected}, got {got}")]
    ColumnType {
        column: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("non-finite prediction {0}")]
    NonFinite(f64),

    #[error("empty input frame")]
    EmptyFrame,

    #[error("{0}")]
    Backend(String),
}

/// Request-time failures, mapped to HTTP status codes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("{detail}")]
    Validation { status: StatusCode, detail: String },
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Validation { status, .. } => *status,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        ServiceError::Inference(e.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::ModelUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::Inference("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let v = ServiceError::Validation {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "missing field `mileage`".into(),
        };
        assert_eq!(v.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(v.to_string(), "missing field `mileage`");
    }

    #[test]
    fn messages_match_wire_contract() {
        assert_eq!(ServiceError::ModelUnavailable.to_string(), "Model not loaded");
        let e: ServiceError = ModelError::MissingColumn("Mileage".into()).into();
        assert_eq!(e.to_string(), "Inference failed: missing column 'Mileage'");

        let s = StartupError::ModelNotFound {
            path: PathBuf::from("models/model.json"),
        };
        assert_eq!(s.to_string(), "Model file not found at models/model.json");
    }
}
