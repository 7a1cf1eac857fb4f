//! StopTransaction (C6).
//!
//! Unlike RemoteStop (C7), this handler always answers successfully: a
//! charge point reporting a stop for a transaction id we don't recognise
//! still gets `StopTransactionResponse`, we just have nothing to persist.

use rust_ocpp::v1_6::messages::stop_transaction::{StopTransactionRequest, StopTransactionResponse};
use serde_json::Value;
use tracing::{info, warn};

use super::authorize::{resolve, to_wire_id_tag_info};
use super::sampled_value;
use crate::domain::{
    DomainError, IdTagRepository, MeterValueRepository, Session, SessionRepository, SessionStop,
    StopReason,
};

pub async fn handle(
    sessions: &dyn SessionRepository,
    meter_values: &dyn MeterValueRepository,
    id_tags: &dyn IdTagRepository,
    cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: StopTransactionRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let reason = request
        .reason
        .as_ref()
        .map(|r| StopReason::parse(&format!("{r:?}")))
        .unwrap_or(StopReason::Local);

    info!(
        cp_id,
        transaction_id = request.transaction_id,
        meter_stop = request.meter_stop,
        ?reason,
        "StopTransaction"
    );

    match sessions.get_by_transaction_id(request.transaction_id).await? {
        Some(session) => {
            finish(sessions, meter_values, &session, &request, reason).await?;
        }
        None => {
            warn!(
                cp_id,
                transaction_id = request.transaction_id,
                "StopTransaction for an unknown transaction id"
            );
        }
    }

    // §4.4: idTagInfo is only present when the CP supplied an idTag.
    let id_tag_info = match &request.id_tag {
        Some(id_tag) => Some(to_wire_id_tag_info(&resolve(id_tags, id_tag).await)),
        None => None,
    };

    let response = StopTransactionResponse { id_tag_info };
    serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()))
}

async fn finish(
    sessions: &dyn SessionRepository,
    meter_values: &dyn MeterValueRepository,
    session: &Session,
    request: &StopTransactionRequest,
    reason: StopReason,
) -> Result<(), DomainError> {
    let meter_stop = request.meter_stop as i64;
    let energy_consumed = Session::compute_energy_consumed(session.meter_start, meter_stop);

    sessions
        .stop(
            request.transaction_id,
            SessionStop {
                meter_stop,
                stop_timestamp: request.timestamp.naive_utc(),
                stop_reason: reason,
                energy_consumed,
            },
        )
        .await?;

    if let Some(transaction_data) = &request.transaction_data {
        for mv in transaction_data {
            for sampled in &mv.sampled_value {
                let Some(mut new_value) = sampled_value::decode(mv.timestamp.naive_utc(), sampled) else {
                    warn!(value = sampled.value.as_str(), "skipping non-numeric sampled value");
                    continue;
                };
                new_value.session_id = Some(session.id);
                new_value.context = "Transaction.End".to_string();
                meter_values.append(new_value).await?;
            }
        }
    }

    Ok(())
}
