use axum::response::{IntoResponse, Response};
use std::fmt;

use crate::api::ErrorResponse;

pub const NO_BOOK_EXISTS: &str = "no book exists";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("failed to encode comments: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Title,
    Comment,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::Title => write!(f, "title"),
            RequiredField::Comment => write!(f, "comment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(RequiredField),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "missing required field {}", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Handler outcome that is not a success body.
///
/// Every variant renders with status 200: the body text or shape is the only signal.
#[derive(Debug)]
pub enum BookError {
    Validation(ValidationError),
    NotFound,
    Store { reply: &'static str, source: StoreError },
}

impl BookError {
    pub fn store(reply: &'static str, source: StoreError) -> Self {
        BookError::Store { reply, source }
    }
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BookError::*;
        match self {
            Validation(e) => write!(f, "ValidationError: {}", e),
            NotFound => write!(f, "NotFoundError: {}", NO_BOOK_EXISTS),
            Store { reply, source } => write!(f, "StoreError: {}: {}", reply, crate::unpack_error(source)),
        }
    }
}

impl std::error::Error for BookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use BookError::*;
        match self {
            Validation(e) => Some(e),
            Store { source, .. } => Some(source),
            NotFound => None,
        }
    }
}

impl From<ValidationError> for BookError {
    fn from(error: ValidationError) -> Self {
        BookError::Validation(error)
    }
}

impl IntoResponse for BookError {
    fn into_response(self) -> Response {
        match self {
            BookError::Validation(e) => crate::text_response(e.to_string()),
            BookError::NotFound => crate::text_response(NO_BOOK_EXISTS),
            BookError::Store { reply, .. } => crate::json_response(ErrorResponse {
                error: reply.to_string(),
            }),
        }
    }
}
