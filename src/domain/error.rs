//! Domain-level error taxonomy.
//!
//! Kept separate from the transport-level [`crate::support::OcppFrameError`]
//! and the command-level `CommandError`: a handler never sees the other two.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("charge point {0} not found")]
    ChargePointNotFound(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(i32),

    #[error("id tag {0} not found")]
    IdTagNotFound(String),

    #[error("transaction {0} already has no active session")]
    TransactionNotActive(i32),

    #[error("connector {1} on {0} already has an active session")]
    ConnectorOccupied(String, i32),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}
