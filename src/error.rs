// Application error type and its HTTP rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api_client::ApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("{0}")]
    Unauthorized(String),

    // Pages that need a session send the browser to the login screen instead of a bare 401
    #[error("Login required")]
    LoginRequired,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Backend { status: StatusCode, message: String },
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Backend { status, message } => match status {
                StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
                StatusCode::NOT_FOUND => AppError::NotFound(message),
                _ => AppError::Backend { status, message },
            },
            other => AppError::InternalServerError(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Unauthorized(message) => {
                tracing::warn!("Unauthorized access attempt: {}", message);
                (StatusCode::UNAUTHORIZED, message)
            }
            AppError::LoginRequired => return Redirect::to("/login").into_response(),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Backend { status, message } => {
                tracing::warn!("Backend rejected request ({}): {}", status, message);
                (status, message)
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
