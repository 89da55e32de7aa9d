//! Translation of failures into HTTP responses.
//!
//! Every variant maps to exactly one status code.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::AccountError;
use crate::manager::ManagerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Unauthenticated { realm: String, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotFound(msg) => ApiError::NotFound(msg),
            ManagerError::Validation(msg) => ApiError::Validation(msg),
            ManagerError::Domain(e) => e.into(),
            ManagerError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::BeneficiaryNotFound(_) => ApiError::NotFound(err.to_string()),
            AccountError::InvalidBeneficiaryName => ApiError::Validation(err.to_string()),
            AccountError::DuplicateBeneficiary(_) | AccountError::AllocationExceeded { .. } => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();

        if let ApiError::Unauthenticated { realm, .. } = &self {
            let challenge = format!("Basic realm=\"{realm}\"");
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ManagerError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ManagerError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ManagerError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ManagerError::Domain(AccountError::DuplicateBeneficiary("a".into())),
                StatusCode::CONFLICT,
            ),
            (
                ManagerError::Domain(AccountError::AllocationExceeded {
                    name: "a".into(),
                    total: Decimal::new(11, 1),
                }),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_unauthenticated_challenge() {
        let response = ApiError::Unauthenticated {
            realm: "accounts".into(),
            message: "authentication required".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"accounts\""
        );
    }
}
