//! ChangeAvailability (C7).

use chrono::Utc;
use rust_ocpp::v1_6::messages::change_availability::{
    ChangeAvailabilityRequest, ChangeAvailabilityResponse,
};
use rust_ocpp::v1_6::types::AvailabilityType;
use tracing::info;

use crate::application::commands::{ChangeAvailabilityResult, CommandError, SharedCommandSender};
use crate::application::registry::{Lookup, SessionRegistry};
use crate::domain::ChargePointRepository;
use crate::support::time::to_ocpp_iso;

/// connectorId is bounded to {0, 1} in this MVP (§4.7).
const MAX_CONNECTOR_ID: i32 = 1;

fn rejected(cp_id: &str, connector_id: i32, kind: &str, error: String) -> ChangeAvailabilityResult {
    ChangeAvailabilityResult {
        status: "Rejected".to_string(),
        cp_id: cp_id.to_string(),
        connector_id,
        r#type: kind.to_string(),
        timestamp: None,
        error: Some(error),
    }
}

pub async fn change_availability(
    charge_points: &dyn ChargePointRepository,
    registry: &SessionRegistry,
    command_sender: &SharedCommandSender,
    cp_id: &str,
    connector_id: i32,
    kind: &str,
) -> ChangeAvailabilityResult {
    let availability_type = match kind {
        "Operative" => AvailabilityType::Operative,
        "Inoperative" => AvailabilityType::Inoperative,
        other => {
            return rejected(
                cp_id,
                connector_id,
                kind,
                format!("invalid availability type {other:?}"),
            )
        }
    };

    if !(0..=MAX_CONNECTOR_ID).contains(&connector_id) {
        return rejected(
            cp_id,
            connector_id,
            kind,
            format!("connectorId {connector_id} is out of range"),
        );
    }

    let known_and_online = matches!(
        charge_points.get(cp_id).await,
        Ok(Some(row)) if row.is_online
    );
    if !known_and_online {
        return rejected(
            cp_id,
            connector_id,
            kind,
            CommandError::NotConnected(cp_id.to_string()).to_string(),
        );
    }

    if !registry.is_connected(cp_id) {
        return rejected(
            cp_id,
            connector_id,
            kind,
            CommandError::OnlineElsewhere(cp_id.to_string()).to_string(),
        );
    }

    info!(cp_id, connector_id, kind, "sending ChangeAvailability");

    let request = ChangeAvailabilityRequest {
        connector_id: connector_id as u32,
        r#type: availability_type,
    };
    let payload = match serde_json::to_value(&request) {
        Ok(v) => v,
        Err(e) => {
            return rejected(cp_id, connector_id, kind, format!("serialization failed: {e}"))
        }
    };

    let outcome = command_sender
        .send_command(cp_id, "ChangeAvailability", payload)
        .await
        .and_then(|value| {
            serde_json::from_value::<ChangeAvailabilityResponse>(value)
                .map_err(|e| CommandError::InvalidResponse(e.to_string()))
        });

    match outcome {
        // Scheduled is a success, not an error — the CP applies the change
        // once its in-progress transaction finishes (§4.7).
        Ok(response) => ChangeAvailabilityResult {
            status: format!("{:?}", response.status),
            cp_id: cp_id.to_string(),
            connector_id,
            r#type: kind.to_string(),
            timestamp: Some(to_ocpp_iso(&Utc::now())),
            error: None,
        },
        Err(e) => rejected(cp_id, connector_id, kind, e.to_string()),
    }
}
