//! API error handling.
//!
//! Every failure leaves the service as a status code plus a `{"detail": ...}`
//! body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::{ErrorResponse, ListQueryError};
use thiserror::Error;

use crate::store::StoreError;

pub const TASK_ALREADY_EXISTS: &str = "Tarefa já existe!";
pub const TASK_FIELDS_REQUIRED: &str = "Nome e descrição são obrigatórios!";
pub const TASK_NOT_FOUND: &str = "Tarefa não encontrada!";
pub const INVALID_CREDENTIALS: &str = "Usuário ou senha inválidos";
pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const INTERNAL_ERROR: &str = "Erro interno do servidor";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    pub fn task_already_exists() -> Self {
        Self::bad_request(TASK_ALREADY_EXISTS)
    }

    pub fn task_fields_required() -> Self {
        Self::bad_request(TASK_FIELDS_REQUIRED)
    }

    pub fn task_not_found() -> Self {
        Self::NotFound(TASK_NOT_FOUND)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Store failures are never described.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ListQueryError> for ApiError {
    fn from(error: ListQueryError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(error) = &self {
            tracing::error!(%error, "store failure");
        }

        let status = self.status();
        let body = Json(ErrorResponse {
            detail: self.detail(),
        });

        if let ApiError::Unauthorized(_) = self {
            let challenge = [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"))];
            return (status, challenge, body).into_response();
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::task_already_exists(), StatusCode::BAD_REQUEST, TASK_ALREADY_EXISTS)]
    #[case(ApiError::task_fields_required(), StatusCode::BAD_REQUEST, TASK_FIELDS_REQUIRED)]
    #[case(ApiError::task_not_found(), StatusCode::NOT_FOUND, TASK_NOT_FOUND)]
    #[case(
        ApiError::Unauthorized(INVALID_CREDENTIALS),
        StatusCode::UNAUTHORIZED,
        INVALID_CREDENTIALS
    )]
    #[case(
        ApiError::from(ListQueryError::InvalidPagination),
        StatusCode::BAD_REQUEST,
        "Parâmetros inválidos: 'page' e 'limit' devem ser maiores que 0"
    )]
    fn maps_status_and_detail(
        #[case] error: ApiError,
        #[case] status: StatusCode,
        #[case] detail: &str,
    ) {
        assert_eq!(error.status(), status);
        assert_eq!(error.detail(), detail);
    }

    #[test]
    fn unauthorized_carries_basic_challenge() {
        let response = ApiError::Unauthorized(NOT_AUTHENTICATED).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic"
        );
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let error = ApiError::from(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.detail(), INTERNAL_ERROR);

        let response = error.into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
