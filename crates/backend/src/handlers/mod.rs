pub mod a001_formulario;
pub mod a002_gasto;
pub mod a003_orden;

use axum::http::StatusCode;
use contracts::domain::common::DomainError;

/// Map a typed domain failure onto the HTTP status carried next to the
/// envelope. Partial writes and raw store faults are server-side errors;
/// everything else is the caller's problem.
pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::ReferenceNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::UniqueViolation(_) => StatusCode::CONFLICT,
        DomainError::PartialWrite { .. } | DomainError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Shared id-path parsing; a malformed uuid never reaches the services
pub fn parse_id(raw: &str) -> Result<uuid::Uuid, DomainError> {
    uuid::Uuid::parse_str(raw).map_err(|_| DomainError::Validation(format!("invalid id '{}'", raw)))
}
