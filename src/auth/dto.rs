use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::error::ErrorKind;

/// Request body for user registration.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access and refresh tokens issued by one login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Envelope shared by every response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub code: u16,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, status: StatusCode, data: Option<T>) -> Self {
        Self {
            message: message.into(),
            code: status.as_u16(),
            data,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, status: StatusCode, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            code: status.as_u16(),
            data: None,
            error: Some(kind),
        }
    }
}
