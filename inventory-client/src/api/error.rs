use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field message inside a backend error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub message: String,
}

/// `{ message, errors?: { field: { message } } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, FieldMessage>>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.get_or_insert_with(BTreeMap::new).insert(
            field.into(),
            FieldMessage {
                message: message.into(),
            },
        );
        self
    }

    /// Fallback when the body is missing or not the expected JSON.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::new(
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Request rejected ({status}): {}", body.message)]
    Rejected { status: u16, body: ErrorBody },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Saved {0} came back without an id")]
    MissingId(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }

    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = match response.text().await {
            Ok(text) => serde_json::from_str::<ErrorBody>(&text)
                .unwrap_or_else(|_| ErrorBody::from_status(status)),
            Err(_) => ErrorBody::from_status(status),
        };

        ApiError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}
