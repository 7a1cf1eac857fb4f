//! RemoteStopTransaction (C7).

use chrono::Utc;
use rust_ocpp::v1_6::messages::remote_stop_transaction::{
    RemoteStopTransactionRequest, RemoteStopTransactionResponse,
};
use rust_ocpp::v1_6::types::RemoteStartStopStatus;
use tracing::info;

use crate::application::commands::{CommandError, RemoteStopResult, SharedCommandSender};
use crate::application::registry::{Lookup, SessionRegistry};
use crate::domain::{ChargePointRepository, SessionRepository, SessionStatus};
use crate::support::time::to_ocpp_iso;

/// Pre-validate the transaction, resolve the live session, send the Call,
/// and report a structured outcome (§4.7).
pub async fn remote_stop_transaction(
    sessions: &dyn SessionRepository,
    charge_points: &dyn ChargePointRepository,
    registry: &SessionRegistry,
    command_sender: &SharedCommandSender,
    cp_id: &str,
    transaction_id: i32,
) -> RemoteStopResult {
    let session = match sessions.get_by_transaction_id(transaction_id).await {
        Ok(Some(row)) => row,
        _ => {
            return RemoteStopResult {
                success: false,
                status: "Rejected".to_string(),
                cp_id: cp_id.to_string(),
                transaction_id,
                timestamp: None,
                error: Some(format!("transaction {transaction_id} not found")),
            }
        }
    };

    if session.charge_point_id != cp_id {
        return RemoteStopResult {
            success: false,
            status: "Rejected".to_string(),
            cp_id: cp_id.to_string(),
            transaction_id,
            timestamp: None,
            error: Some(format!(
                "transaction {transaction_id} belongs to {}",
                session.charge_point_id
            )),
        };
    }

    if session.status != SessionStatus::Active {
        return RemoteStopResult {
            success: false,
            status: "Rejected".to_string(),
            cp_id: cp_id.to_string(),
            transaction_id,
            timestamp: None,
            error: Some(format!("transaction {transaction_id} is not active")),
        };
    }

    match registry.lookup(cp_id) {
        Lookup::Connected(_) => {}
        Lookup::NotInThisProcess => {
            let online_elsewhere = matches!(
                charge_points.get(cp_id).await,
                Ok(Some(row)) if row.is_online
            );
            let error = if online_elsewhere {
                CommandError::OnlineElsewhere(cp_id.to_string())
            } else {
                CommandError::NotConnected(cp_id.to_string())
            };
            return RemoteStopResult {
                success: false,
                status: "Rejected".to_string(),
                cp_id: cp_id.to_string(),
                transaction_id,
                timestamp: None,
                error: Some(error.to_string()),
            };
        }
    }

    info!(cp_id, transaction_id, "sending RemoteStopTransaction");

    let request = RemoteStopTransactionRequest { transaction_id };
    let payload = match serde_json::to_value(&request) {
        Ok(v) => v,
        Err(e) => {
            return RemoteStopResult {
                success: false,
                status: "Rejected".to_string(),
                cp_id: cp_id.to_string(),
                transaction_id,
                timestamp: None,
                error: Some(format!("serialization failed: {e}")),
            }
        }
    };

    let outcome = command_sender
        .send_command(cp_id, "RemoteStopTransaction", payload)
        .await
        .and_then(|value| {
            serde_json::from_value::<RemoteStopTransactionResponse>(value)
                .map_err(|e| CommandError::InvalidResponse(e.to_string()))
        });

    match outcome {
        Ok(response) => {
            let accepted = matches!(response.status, RemoteStartStopStatus::Accepted);
            RemoteStopResult {
                success: accepted,
                status: format!("{:?}", response.status),
                cp_id: cp_id.to_string(),
                transaction_id,
                timestamp: Some(to_ocpp_iso(&Utc::now())),
                error: None,
            }
        }
        Err(e) => RemoteStopResult {
            success: false,
            status: "Rejected".to_string(),
            cp_id: cp_id.to_string(),
            transaction_id,
            timestamp: None,
            error: Some(e.to_string()),
        },
    }
}
