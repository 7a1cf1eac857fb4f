//! RemoteStartTransaction (C7).

use chrono::Utc;
use rust_ocpp::v1_6::messages::remote_start_transaction::{
    RemoteStartTransactionRequest, RemoteStartTransactionResponse,
};
use rust_ocpp::v1_6::types::RemoteStartStopStatus;
use tracing::info;

use crate::application::commands::{CommandError, RemoteStartResult, SharedCommandSender};
use crate::application::registry::{Lookup, SessionRegistry};
use crate::domain::{resolve_id_tag, ChargePointRepository, IdTagRepository, IdTagStatus};
use crate::support::time::to_ocpp_iso;

/// Pre-validate the tag, resolve the live session, send the Call, and
/// report a structured outcome — never an exception (§4.7 / §7).
pub async fn remote_start_transaction(
    id_tags: &dyn IdTagRepository,
    charge_points: &dyn ChargePointRepository,
    registry: &SessionRegistry,
    command_sender: &SharedCommandSender,
    cp_id: &str,
    id_tag: &str,
    connector_id: Option<i32>,
) -> RemoteStartResult {
    let now = Utc::now().naive_utc();

    let tag_row = match id_tags.get(id_tag).await {
        Ok(row) => row,
        Err(_) => None,
    };
    let resolved = resolve_id_tag(tag_row.as_ref(), now);
    if resolved.status != IdTagStatus::Accepted {
        return RemoteStartResult {
            success: false,
            status: "Rejected".to_string(),
            cp_id: cp_id.to_string(),
            id_tag: id_tag.to_string(),
            connector_id,
            timestamp: None,
            error: Some("id tag not accepted".to_string()),
            id_tag_status: Some(resolved.status.to_string()),
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
            return RemoteStartResult {
                success: false,
                status: "Rejected".to_string(),
                cp_id: cp_id.to_string(),
                id_tag: id_tag.to_string(),
                connector_id,
                timestamp: None,
                error: Some(error.to_string()),
                id_tag_status: Some(resolved.status.to_string()),
            };
        }
    }

    info!(cp_id, id_tag, ?connector_id, "sending RemoteStartTransaction");

    let request = RemoteStartTransactionRequest {
        connector_id,
        id_tag: id_tag.to_string(),
        charging_profile: None,
    };
    let payload = match serde_json::to_value(&request) {
        Ok(v) => v,
        Err(e) => {
            return RemoteStartResult {
                success: false,
                status: "Rejected".to_string(),
                cp_id: cp_id.to_string(),
                id_tag: id_tag.to_string(),
                connector_id,
                timestamp: None,
                error: Some(format!("serialization failed: {e}")),
                id_tag_status: Some(resolved.status.to_string()),
            }
        }
    };

    let outcome = command_sender
        .send_command(cp_id, "RemoteStartTransaction", payload)
        .await
        .and_then(|value| {
            serde_json::from_value::<RemoteStartTransactionResponse>(value)
                .map_err(|e| CommandError::InvalidResponse(e.to_string()))
        });

    match outcome {
        Ok(response) => {
            let accepted = matches!(response.status, RemoteStartStopStatus::Accepted);
            RemoteStartResult {
                success: accepted,
                status: format!("{:?}", response.status),
                cp_id: cp_id.to_string(),
                id_tag: id_tag.to_string(),
                connector_id,
                timestamp: Some(to_ocpp_iso(&Utc::now())),
                error: None,
                id_tag_status: Some(resolved.status.to_string()),
            }
        }
        Err(e) => RemoteStartResult {
            success: false,
            status: "Rejected".to_string(),
            cp_id: cp_id.to_string(),
            id_tag: id_tag.to_string(),
            connector_id,
            timestamp: None,
            error: Some(e.to_string()),
            id_tag_status: Some(resolved.status.to_string()),
        },
    }
}
