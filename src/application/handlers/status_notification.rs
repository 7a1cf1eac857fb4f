//! StatusNotification (C6).
//!
//! Appended as a log row unconditionally; `connectorId = 0` additionally
//! mirrors the status onto the charge point's own row (§4.4), since that's
//! the connector id OCPP 1.6 uses for charge-point-level status.

use chrono::Utc;
use rust_ocpp::v1_6::messages::status_notification::{
    StatusNotificationRequest, StatusNotificationResponse,
};
use rust_ocpp::v1_6::types::ChargePointStatus;
use serde_json::Value;
use tracing::info;

use crate::domain::{ChargePointRepository, ConnectorStatusRepository, DomainError, NewConnectorStatus, OcppStatus};

fn to_domain_status(status: &ChargePointStatus) -> OcppStatus {
    match status {
        ChargePointStatus::Available => OcppStatus::Available,
        ChargePointStatus::Preparing => OcppStatus::Preparing,
        ChargePointStatus::Charging => OcppStatus::Charging,
        ChargePointStatus::SuspendedEV => OcppStatus::SuspendedEV,
        ChargePointStatus::SuspendedEVSE => OcppStatus::SuspendedEVSE,
        ChargePointStatus::Finishing => OcppStatus::Finishing,
        ChargePointStatus::Reserved => OcppStatus::Reserved,
        ChargePointStatus::Unavailable => OcppStatus::Unavailable,
        ChargePointStatus::Faulted => OcppStatus::Faulted,
    }
}

pub async fn handle(
    charge_points: &dyn ChargePointRepository,
    connector_status: &dyn ConnectorStatusRepository,
    cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: StatusNotificationRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let status = to_domain_status(&request.status);

    info!(
        cp_id,
        connector_id = request.connector_id,
        ?status,
        error_code = ?request.error_code,
        "StatusNotification"
    );

    connector_status
        .append(NewConnectorStatus {
            charge_point_id: cp_id.to_string(),
            connector_id: request.connector_id,
            status,
            error_code: format!("{:?}", request.error_code),
            timestamp: request.timestamp.map(|t| t.naive_utc()),
            info: request.info.clone(),
            vendor_id: request.vendor_id.clone(),
            vendor_error_code: request.vendor_error_code.clone(),
        })
        .await?;

    if request.connector_id == 0 {
        let now = Utc::now().naive_utc();
        charge_points.set_status(cp_id, status, now).await?;
    }

    serde_json::to_value(&StatusNotificationResponse {}).map_err(|e| DomainError::Storage(e.to_string()))
}
