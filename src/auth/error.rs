use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{
    claims::TokenKind, dto::ApiResponse, jwt::TokenError, password::HashError, repo::StoreError,
};

/// Why a login was refused. Only logged; clients see a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialFailure {
    #[error("email not found")]
    EmailNotFound,
    #[error("password mismatch")]
    PasswordMismatch,
}

/// Stable, machine-checkable error class. Serialized as [`ErrorKind::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateAccount,
    Hashing,
    Persistence,
    InvalidCredentials,
    TokenIssuance,
    /// Rejected by the HTTP layer before reaching the service.
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::DuplicateAccount => "duplicate_account",
            ErrorKind::Hashing => "hashing",
            ErrorKind::Persistence => "persistence",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::TokenIssuance => "token_issuance",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    DuplicateAccount,
    #[error("error hashing password")]
    Hashing(#[source] HashError),
    #[error("user store failure")]
    Persistence(#[source] StoreError),
    #[error("{0}")]
    InvalidCredentials(CredentialFailure),
    #[error("error generating {kind} token")]
    TokenIssuance {
        kind: TokenKind,
        #[source]
        source: TokenError,
    },
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::DuplicateAccount => ErrorKind::DuplicateAccount,
            AuthError::Hashing(_) => ErrorKind::Hashing,
            AuthError::Persistence(_) => ErrorKind::Persistence,
            AuthError::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            AuthError::TokenIssuance { .. } => ErrorKind::TokenIssuance,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::DuplicateAccount => StatusCode::CONFLICT,
            ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Hashing | ErrorKind::Persistence | ErrorKind::TokenIssuance => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(_) => "invalid credentials".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind().as_str(), error = ?self, "request failed");
        } else {
            warn!(kind = self.kind().as_str(), reason = %self, "request rejected");
        }
        let body = ApiResponse::<()>::error(self.public_message(), status, self.kind());
        (status, Json(body)).into_response()
    }
}

/// Error returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => e.into_response(),
            ApiError::InvalidRequest(msg) => {
                warn!(reason = %msg, "invalid request");
                let status = StatusCode::BAD_REQUEST;
                let body = ApiResponse::<()>::error(msg, status, ErrorKind::InvalidRequest);
                (status, Json(body)).into_response()
            }
        }
    }
}
