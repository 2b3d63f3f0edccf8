//! Centralized error types for the onkyo-ctl core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

/// Errors produced by the eISCP client.
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum EiscpError {
    /// An argument was rejected before any network I/O took place.
    #[error("validation error: {0}")]
    Validation(String),

    /// The TCP connection to the receiver could not be established.
    #[error("connection error: {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a frame failed, or a response could not be interpreted.
    #[error("transport error: {0}")]
    Transport(String),

    /// No inbound frame arrived within the response window.
    #[error("timeout error: no response received within {0:?}")]
    Timeout(Duration),

    /// The session's connection has been closed.
    #[error("session closed")]
    Closed,
}

/// Convenient Result alias for eISCP operations.
pub type EiscpResult<T> = Result<T, EiscpError>;

impl EiscpError {
    /// Shorthand for building a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for building a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Maps the error to the HTTP status the API reports for it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Connection { .. } | Self::Transport(_) | Self::Closed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl ErrorCode for EiscpError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Connection { .. } => "connection_failed",
            Self::Transport(_) => "transport_error",
            Self::Timeout(_) => "timeout",
            Self::Closed => "session_closed",
        }
    }
}

/// Application-wide error type for the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The receiver or the session reported an error.
    #[error(transparent)]
    Device(#[from] EiscpError),
}

impl ApiError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Device(e) => e.code(),
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Device(e) => e.status_code(),
        }
    }
}

/// Convenient Result alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::warn!("[API] {} ({})", self, status);
        }
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
