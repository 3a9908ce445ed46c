use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use std::any::Any;
use thiserror::Error;

use crate::api::envelope::ApiResponse;
use crate::logic::ValidationErrors;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

pub const MSG_VALIDATION: &str = "Error de validación";
pub const MSG_DUPLICATE_ON_CREATE: &str = "Ya existe una persona con esta cédula";
pub const MSG_DUPLICATE_ON_UPDATE: &str = "Ya existe otra persona con esta cédula";
pub const MSG_INVALID_ID: &str = "ID de persona inválido";
pub const MSG_NOT_FOUND: &str = "Persona no encontrada";
pub const MSG_INTERNAL: &str = "Error interno del servidor";
pub const MSG_TIMEOUT: &str = "Tiempo de espera agotado";

/// Failures of a request handler, each mapped to a status and envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("duplicate cedula {cedula}")]
    Duplicate {
        message: &'static str,
        cedula: String,
    },
    #[error("invalid persona id: {0}")]
    InvalidId(String),
    #[error("persona not found: {0}")]
    NotFound(String),
    #[error("request timed out")]
    Timeout,
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn duplicate_on_create(cedula: impl Into<String>) -> Self {
        Self::Duplicate {
            message: MSG_DUPLICATE_ON_CREATE,
            cedula: cedula.into(),
        }
    }

    pub fn duplicate_on_update(cedula: impl Into<String>) -> Self {
        Self::Duplicate {
            message: MSG_DUPLICATE_ON_UPDATE,
            cedula: cedula.into(),
        }
    }

    pub fn not_found(lookup: impl Into<String>) -> Self {
        Self::NotFound(lookup.into())
    }

    /// Store failure seen while updating: duplicates get the update wording.
    pub fn from_update(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { cedula } => Self::duplicate_on_update(cedula),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { cedula } => Self::duplicate_on_create(cedula),
            StoreError::NotFound => Self::NotFound(String::new()),
            StoreError::InvalidIdentifier(raw) => Self::InvalidId(raw),
            StoreError::Unclassified(e) => Self::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidId(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => {
                log::debug!("Rejected request: {}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ApiResponse::with_errors(MSG_VALIDATION, errors.messages()),
                )
            }
            Self::Duplicate { message, cedula } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::with_error(
                    message,
                    format!("La cédula {} ya está registrada", cedula),
                ),
            ),
            Self::InvalidId(raw) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::with_error(
                    MSG_INVALID_ID,
                    format!("'{}' no es un identificador válido", raw),
                ),
            ),
            Self::NotFound(lookup) => {
                let detail = if lookup.is_empty() {
                    MSG_NOT_FOUND.to_string()
                } else {
                    format!("No existe una persona con {}", lookup)
                };
                (
                    StatusCode::NOT_FOUND,
                    ApiResponse::with_error(MSG_NOT_FOUND, detail),
                )
            }
            Self::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                ApiResponse::with_error(
                    MSG_TIMEOUT,
                    "La solicitud no se completó a tiempo".to_string(),
                ),
            ),
            Self::Internal(e) => {
                log::error!("Unhandled store failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::with_error(MSG_INTERNAL, e.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Error handler for the request timeout layer.
pub async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        log::warn!("Request exceeded the configured timeout");
        ApiError::Timeout
    } else {
        ApiError::Internal(anyhow::anyhow!("middleware failure: {}", err))
    }
}

/// Panic handler for the catch-panic layer.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(ValidationErrors::single("cedula", "x")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::DuplicateKey {
                    cedula: "1234567890".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::InvalidIdentifier("abc".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(StoreError::NotFound), StatusCode::NOT_FOUND),
            (ApiError::Timeout, StatusCode::REQUEST_TIMEOUT),
            (
                ApiError::from(StoreError::Unclassified(anyhow::anyhow!("boom"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_update_duplicates_use_update_wording() {
        let err = ApiError::from_update(StoreError::DuplicateKey {
            cedula: "1234567890".to_string(),
        });
        assert!(matches!(
            err,
            ApiError::Duplicate { message, .. } if message == MSG_DUPLICATE_ON_UPDATE
        ));
        assert!(matches!(
            ApiError::from_update(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_timeout_handler_maps_elapsed_only() {
        let elapsed: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        assert!(matches!(handle_timeout(elapsed).await, ApiError::Timeout));

        let other: BoxError = "overloaded".into();
        assert!(matches!(handle_timeout(other).await, ApiError::Internal(_)));
    }

    #[test]
    fn test_panic_handler_answers_internal_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
