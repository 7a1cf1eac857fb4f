//! Call dispatch (C4): routes a decoded Call's Action to its C6 handler and
//! turns the outcome into either a CallResult payload or a CallError per
//! the taxonomy of §7.

use serde_json::Value;
use thiserror::Error;

use crate::application::handlers::{
    authorize, boot_notification, heartbeat, meter_values, start_transaction,
    status_notification, stop_transaction,
};
use crate::domain::{DomainError, RepositoryProvider};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("NotImplemented")]
    NotImplemented,
    #[error("FormationViolation: {0}")]
    FormationViolation(String),
    #[error("InternalError: {0}")]
    InternalError(String),
}

impl ProtocolError {
    /// The CallError `errorCode` this maps onto (§4.1, §7).
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::NotImplemented => "NotImplemented",
            ProtocolError::FormationViolation(_) => "FormationViolation",
            ProtocolError::InternalError(_) => "InternalError",
        }
    }

    pub fn error_description(&self) -> String {
        self.to_string()
    }
}

impl From<DomainError> for ProtocolError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidPayload(msg) => ProtocolError::FormationViolation(msg),
            other => ProtocolError::InternalError(other.to_string()),
        }
    }
}

/// Route a Call's `action`/`payload` to its handler (§4.6). `repo` is the
/// single aggregate repository handle; handlers borrow only the narrow
/// traits they need from it.
pub async fn dispatch(
    repo: &dyn RepositoryProvider,
    cp_id: &str,
    action: &str,
    payload: Value,
) -> Result<Value, ProtocolError> {
    let result = match action {
        "BootNotification" => boot_notification::handle(repo, cp_id, payload).await,
        "Heartbeat" => heartbeat::handle(repo, cp_id, payload).await,
        "Authorize" => authorize::handle(repo, cp_id, payload).await,
        "StartTransaction" => start_transaction::handle(repo, repo, cp_id, payload).await,
        "StopTransaction" => stop_transaction::handle(repo, repo, repo, cp_id, payload).await,
        "MeterValues" => meter_values::handle(repo, repo, cp_id, payload).await,
        "StatusNotification" => status_notification::handle(repo, repo, cp_id, payload).await,
        _ => return Err(ProtocolError::NotImplemented),
    };
    result.map_err(ProtocolError::from)
}
