//! Unified error handling
//!
//! One application-level error type with `E`-prefixed codes and a JSON
//! `{code, message}` body. Database and gateway internals are logged at the
//! conversion point and surfaced to clients as opaque messages.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::gateway::GatewayError;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Token expired")]
    TokenExpired,

    // ========== Request validation ==========
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    // ========== Gateway ==========
    #[error("Webhook signature rejected: {message}")]
    Signature { message: String },

    #[error("Payment gateway error: {message}")]
    Gateway { message: String },

    // ========== System ==========
    #[error("Transaction failed: {message}")]
    Transaction { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken { message: message.into() }
    }

    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature { message: message.into() }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway { message: message.into() }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction { message: message.into() }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Error code string for the response body
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E3001",
            Self::InvalidToken { .. } => "E3002",
            Self::TokenExpired => "E3003",
            Self::Validation { .. } => "E0002",
            Self::NotFound { .. } => "E0003",
            Self::Signature { .. } => "E4001",
            Self::Gateway { .. } => "E4002",
            Self::Transaction { .. } => "E9003",
            Self::Database { .. } => "E9002",
            Self::Internal { .. } => "E9001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidToken { .. } | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Validation { .. } | Self::Signature { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Gateway { .. } => StatusCode::BAD_GATEWAY,
            Self::Transaction { .. } | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal details stay in the logs
            Self::Database { message } => {
                tracing::error!(target: "database", error = %message, "Database error");
                "Database error".to_string()
            }
            Self::Transaction { message } => {
                tracing::error!(target: "orders", error = %message, "Order transaction failed");
                "Order transaction failed".to_string()
            }
            Self::Internal { message } => {
                tracing::error!(target: "internal", error = %message, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            code: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::database(e.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::gateway(e.to_string())
    }
}

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
