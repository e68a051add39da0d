use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Wire form of a `DomainError`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub code: String,
    pub message: String,
}

impl From<&DomainError> for ErrorDto {
    fn from(e: &DomainError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// `{data, error}` envelope for single-entity reads and writes.
/// Exactly one of the two fields is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<ErrorDto>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(e: &DomainError) -> Self {
        Self {
            data: None,
            error: Some(e.into()),
        }
    }
}

/// `{data: [...], error}` envelope for multi-item writes and lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub error: Option<ErrorDto>,
}

impl<T> ListEnvelope<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self { data, error: None }
    }

    pub fn err(e: &DomainError) -> Self {
        Self {
            data: Vec::new(),
            error: Some(e.into()),
        }
    }
}

/// `{success, error}` envelope for deletions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEnvelope {
    pub success: bool,
    pub error: Option<ErrorDto>,
}

impl DeleteEnvelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn err(e: &DomainError) -> Self {
        Self {
            success: false,
            error: Some(e.into()),
        }
    }
}
