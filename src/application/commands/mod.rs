//! Outbound Call sender (C3, outbound half) and the operator command
//! facade (C7): RemoteStartTransaction, RemoteStopTransaction,
//! ChangeAvailability.

pub mod change_availability;
pub mod remote_start;
pub mod remote_stop;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::warn;

use crate::application::registry::{Lookup, SessionRegistry};
use crate::support::OcppFrame;

pub use change_availability::change_availability;
pub use remote_start::remote_start_transaction;
pub use remote_stop::remote_stop_transaction;

/// Result of `remoteStart` (§6's operator-facing interface).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemoteStartResult {
    pub success: bool,
    pub status: String,
    pub cp_id: String,
    pub id_tag: String,
    pub connector_id: Option<i32>,
    pub timestamp: Option<String>,
    pub error: Option<String>,
    pub id_tag_status: Option<String>,
}

/// Result of `remoteStop`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemoteStopResult {
    pub success: bool,
    pub status: String,
    pub cp_id: String,
    pub transaction_id: i32,
    pub timestamp: Option<String>,
    pub error: Option<String>,
}

/// Result of `changeAvailability`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChangeAvailabilityResult {
    pub status: String,
    pub cp_id: String,
    pub connector_id: i32,
    pub r#type: String,
    pub timestamp: Option<String>,
    pub error: Option<String>,
}

/// Default per-Call await, per §4.1/§5.
pub const RESPONSE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("charge point {0} is not connected to this process")]
    NotConnected(String),
    #[error("charge point {0} is online but not reachable from this process")]
    OnlineElsewhere(String),
    #[error("failed to send Call: {0}")]
    SendFailed(String),
    #[error("timed out waiting for response")]
    Timeout,
    #[error("session closed while awaiting response")]
    SessionClosed,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("CallError {code}: {description}")]
    CallError { code: String, description: String },
}

struct PendingRequest {
    responder: oneshot::Sender<Result<Value, CommandError>>,
}

/// Maintains, per live connection, the table of `UniqueId -> awaiter` for
/// Calls this process originated (the outbound half of C3), and resolves
/// them into CallResult/CallError when the CP answers.
pub struct CommandSender {
    registry: Arc<SessionRegistry>,
    pending: DashMap<(String, String), PendingRequest>,
    message_counter: AtomicU64,
}

pub type SharedCommandSender = Arc<CommandSender>;

impl CommandSender {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            pending: DashMap::new(),
            message_counter: AtomicU64::new(0),
        }
    }

    fn generate_message_id(&self) -> String {
        let n = self.message_counter.fetch_add(1, Ordering::Relaxed);
        format!("CS-{n}")
    }

    /// Send a Call to `charge_point_id` and await its CallResult/CallError
    /// under the 30 s deadline (§4.1, §5).
    pub async fn send_command(
        &self,
        charge_point_id: &str,
        action: &str,
        payload: Value,
    ) -> Result<Value, CommandError> {
        let connection = match self.registry.lookup(charge_point_id) {
            Lookup::Connected(conn) => conn,
            Lookup::NotInThisProcess => {
                return Err(CommandError::NotConnected(charge_point_id.to_string()))
            }
        };

        let unique_id = self.generate_message_id();
        let key = (charge_point_id.to_string(), unique_id.clone());

        let (tx, rx) = oneshot::channel();
        self.pending.insert(key.clone(), PendingRequest { responder: tx });

        let frame = OcppFrame::Call {
            unique_id: unique_id.clone(),
            action: action.to_string(),
            payload,
        };

        if connection.send(frame.serialize()).is_err() {
            self.pending.remove(&key);
            return Err(CommandError::SendFailed(format!(
                "write channel closed for {charge_point_id}"
            )));
        }

        match tokio::time::timeout(Duration::from_secs(RESPONSE_TIMEOUT_SECS), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.remove(&key);
                Err(CommandError::SessionClosed)
            }
            Err(_) => {
                self.pending.remove(&key);
                Err(CommandError::Timeout)
            }
        }
    }

    /// Deliver a decoded CallResult to its awaiter, if one is still
    /// outstanding. Silently dropped if the awaiter already timed out
    /// (§4.1 tie-break).
    pub fn handle_response(&self, charge_point_id: &str, unique_id: &str, payload: Value) {
        let key = (charge_point_id.to_string(), unique_id.to_string());
        if let Some((_, pending)) = self.pending.remove(&key) {
            let _ = pending.responder.send(Ok(payload));
        } else {
            warn!(charge_point_id, unique_id, "dropped unmatched CallResult");
        }
    }

    pub fn handle_error(&self, charge_point_id: &str, unique_id: &str, code: &str, description: &str) {
        let key = (charge_point_id.to_string(), unique_id.to_string());
        if let Some((_, pending)) = self.pending.remove(&key) {
            let _ = pending.responder.send(Err(CommandError::CallError {
                code: code.to_string(),
                description: description.to_string(),
            }));
        } else {
            warn!(charge_point_id, unique_id, "dropped unmatched CallError");
        }
    }

    /// Cancel every outstanding Call for a connection that just closed
    /// (§5: "connection teardown cancels all outstanding outbound Calls").
    pub fn cleanup_charge_point(&self, charge_point_id: &str) {
        let dead: Vec<_> = self
            .pending
            .iter()
            .filter(|entry| entry.key().0 == charge_point_id)
            .map(|entry| entry.key().clone())
            .collect();

        for key in dead {
            if let Some((_, pending)) = self.pending.remove(&key) {
                let _ = pending.responder.send(Err(CommandError::SessionClosed));
            }
        }
    }
}
