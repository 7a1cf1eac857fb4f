//! Heartbeat (C6).

use chrono::Utc;
use rust_ocpp::v1_6::messages::heart_beat::HeartbeatResponse;
use serde_json::Value;
use tracing::warn;

use crate::domain::{ChargePointRepository, DomainError};

pub async fn handle(
    charge_points: &dyn ChargePointRepository,
    cp_id: &str,
    _payload: Value,
) -> Result<Value, DomainError> {
    let now = Utc::now().naive_utc();
    let found = charge_points.touch_heartbeat(cp_id, now).await?;
    if !found {
        warn!(cp_id, "heartbeat from an unregistered charge point");
    }

    let response = HeartbeatResponse {
        current_time: Utc::now(),
    };
    serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()))
}
