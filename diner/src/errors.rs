use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or invalid configuration, fatal at startup
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Filesystem failure outside of a file write (e.g. creating the destination root)
    #[error("Failed to {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Upload violates the declared field rules
    #[error("{message}")]
    Validation { message: String },

    /// A file write failed part way through
    #[error("Failed to store upload at {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An uploaded file exceeds the configured per-file limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Malformed request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking paths or OS error details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message } | Error::PayloadTooLarge { message } | Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Io { .. } | Error::Storage { .. } => "Failed to store uploaded files".to_string(),
            Error::Configuration { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Configuration { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Io { source, .. } | Error::Storage { source, .. } => {
                tracing::error!(error = %source, "Upload storage error: {}", self);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::warn!("Upload rejected: {}", self);
            }
            Error::Validation { .. } | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
