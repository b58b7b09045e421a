use async_trait::async_trait;
use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::convert::Infallible;

use crate::error::{RequiredField, ValidationError};

/// A scalar request field. Numbers and booleans are kept in their text form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateBookRequest {
    pub title: Option<FieldValue>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AddCommentRequest {
    pub comment: Option<FieldValue>,
}

/// Absent, `null` and `""` are missing; any other scalar is accepted as text.
fn required(value: Option<FieldValue>, field: RequiredField) -> Result<String, ValidationError> {
    match value.map(FieldValue::into_text) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

impl CreateBookRequest {
    /// Returns the title to store.
    pub fn validate(self) -> Result<String, ValidationError> {
        required(self.title, RequiredField::Title)
    }
}

impl AddCommentRequest {
    /// Returns the comment to append.
    pub fn validate(self) -> Result<String, ValidationError> {
        required(self.comment, RequiredField::Comment)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request body accepted as JSON or url-encoded form.
///
/// Never rejects: an absent, unknown or malformed body (including a field holding
/// an array or object) yields `T::default()`,
/// so required fields surface as validation errors instead of 4xx responses.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let parsed = if content_type.starts_with("application/x-www-form-urlencoded") {
            Form::<T>::from_request(req, state).await.map(|Form(v)| v).ok()
        } else if content_type.starts_with("application/json") {
            Json::<T>::from_request(req, state).await.map(|Json(v)| v).ok()
        } else {
            None
        };

        if parsed.is_none() && !content_type.is_empty() {
            tracing::debug!(content_type = %content_type, "request body missing or unreadable");
        }

        Ok(Payload(parsed.unwrap_or_default()))
    }
}
