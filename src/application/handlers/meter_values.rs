//! MeterValues (C6).
//!
//! Each sampled value becomes its own row. `session_id` is resolved from
//! `transactionId` when present; non-numeric samples are skipped and
//! logged rather than rejecting the whole Call (§4.4).

use rust_ocpp::v1_6::messages::meter_values::{MeterValuesRequest, MeterValuesResponse};
use serde_json::Value;
use tracing::{info, warn};

use super::sampled_value;
use crate::domain::{DomainError, MeterValueRepository, SessionRepository};

pub async fn handle(
    sessions: &dyn SessionRepository,
    meter_values: &dyn MeterValueRepository,
    cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: MeterValuesRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let session_id = match request.transaction_id {
        Some(tx_id) => match sessions.get_by_transaction_id(tx_id).await? {
            Some(session) => Some(session.id),
            None => {
                warn!(cp_id, transaction_id = tx_id, "MeterValues for an unknown transaction id");
                None
            }
        },
        None => None,
    };

    let mut stored = 0usize;
    for mv in &request.meter_value {
        for sampled in &mv.sampled_value {
            let Some(mut new_value) = sampled_value::decode(mv.timestamp.naive_utc(), sampled) else {
                warn!(
                    cp_id,
                    value = sampled.value.as_str(),
                    "skipping non-numeric sampled value"
                );
                continue;
            };
            new_value.session_id = session_id;
            meter_values.append(new_value).await?;
            stored += 1;
        }
    }

    info!(
        cp_id,
        connector_id = request.connector_id,
        samples = stored,
        "MeterValues"
    );

    serde_json::to_value(&MeterValuesResponse {}).map_err(|e| DomainError::Storage(e.to_string()))
}
