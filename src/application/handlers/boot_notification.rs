//! BootNotification (C6).

use chrono::Utc;
use rust_ocpp::v1_6::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
use rust_ocpp::v1_6::types::RegistrationStatus;
use serde_json::Value;

use crate::domain::{BootNotificationFields, ChargePointRepository, DomainError};

pub async fn handle(
    charge_points: &dyn ChargePointRepository,
    cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: BootNotificationRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let fields = BootNotificationFields {
        vendor: Some(request.charge_point_vendor),
        model: Some(request.charge_point_model),
        charge_point_serial_number: request.charge_point_serial_number,
        charge_box_serial_number: request.charge_box_serial_number,
        firmware_version: request.firmware_version,
        iccid: request.iccid,
        imsi: request.imsi,
        meter_type: request.meter_type,
        meter_serial_number: request.meter_serial_number,
    };

    let now = Utc::now().naive_utc();
    charge_points
        .upsert_boot_notification(cp_id, fields, now)
        .await?;

    let response = BootNotificationResponse {
        status: RegistrationStatus::Accepted,
        current_time: Utc::now(),
        interval: 300,
    };

    serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()))
}
