//! Error types for the CLINIQ system.
//!
//! Every rejection maps onto one of five caller-visible classes
//! ([`ErrorKind`]). The conflict class keeps dedicated variants so that
//! callers get enough detail to self-correct (current vs attempted status,
//! blocking relation and count, remaining balance).

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliniqError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Illegal status transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error(
        "{entity} cannot be deleted: {count} dependent {relation} exist; \
         archive or cancel it instead"
    )]
    DeleteBlocked {
        entity: String,
        relation: String,
        count: u64,
    },

    #[error("Payment of {amount:.2} exceeds the remaining balance of {remaining:.2}")]
    Overpayment { amount: f64, remaining: f64 },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CliniqResult<T> = Result<T, CliniqError>;

/// The five caller-visible error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Stable short name used in structured error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Internal => "Internal",
        }
    }
}

/// Structured error payload returned to callers.
///
/// `error` is the stable kind name; `message` is human-readable. Internal
/// failures are redacted so storage details and invariant diagnostics never
/// leak outward.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl CliniqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CliniqError::Validation { .. } => ErrorKind::Validation,
            CliniqError::Forbidden { .. } => ErrorKind::Forbidden,
            CliniqError::NotFound { .. } => ErrorKind::NotFound,
            CliniqError::InvalidTransition { .. }
            | CliniqError::DeleteBlocked { .. }
            | CliniqError::Overpayment { .. }
            | CliniqError::Conflict { .. } => ErrorKind::Conflict,
            CliniqError::Database(_) | CliniqError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Build the caller-facing body for this error.
    pub fn body(&self) -> ErrorBody {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Internal => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };
        ErrorBody {
            error: kind.as_str(),
            message,
        }
    }
}
