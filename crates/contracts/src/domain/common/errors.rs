use thiserror::Error;

/// Typed failures returned by the write coordinator and the services.
///
/// Every expected domain failure is a value of this enum; nothing in the
/// write path panics on bad input or a failed store call. `Store` is the
/// channel for faults outside the named categories (mapped to HTTP 500).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A checked foreign reference (e.g. contexto.orden_ref) names a row
    /// that does not exist.
    #[error("referenced {entity} not found: {id}")]
    ReferenceNotFound { entity: &'static str, id: String },

    /// Duplicate natural key inside one batch, or a store-level unique
    /// index violation.
    #[error("uniqueness conflict: {0}")]
    UniqueViolation(String),

    /// A later step of a multi-step create failed after an earlier step
    /// had already committed. Compensation has been attempted.
    #[error("partial write at step '{step}': {cause}")]
    PartialWrite { step: &'static str, cause: String },

    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    /// Stable wire code carried by the HTTP envelopes
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound { .. } => "not_found",
            DomainError::ReferenceNotFound { .. } => "reference_not_found",
            DomainError::UniqueViolation(_) => "unique_violation",
            DomainError::PartialWrite { .. } => "partial_write",
            DomainError::Store(_) => "store_error",
        }
    }
}
