//! StartTransaction (C6).
//!
//! Tag resolution, transaction-id allocation, and session insertion are the
//! repository's responsibility (`SessionRepository::create`, §4.6) so that
//! they run inside a single storage transaction and cannot race two starts
//! into the same id.

use rust_ocpp::v1_6::messages::start_transaction::{StartTransactionRequest, StartTransactionResponse};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo as WireIdTagInfo};
use serde_json::Value;
use tracing::{info, warn};

use super::authorize::{resolve, to_wire_id_tag_info};
use crate::domain::{DomainError, IdTagRepository, IdTagStatus, NewSession, SessionRepository};

pub async fn handle(
    id_tags: &dyn IdTagRepository,
    sessions: &dyn SessionRepository,
    cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: StartTransactionRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let info = resolve(id_tags, &request.id_tag).await;
    if info.status != IdTagStatus::Accepted {
        let response = StartTransactionResponse {
            transaction_id: 0,
            id_tag_info: to_wire_id_tag_info(&info),
        };
        return serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()));
    }

    // id_tag_id is resolved again by the repository against the same row;
    // the domain layer only needs a tag string to look up by for StartTransaction.
    let id_tag_row = id_tags
        .get(&request.id_tag)
        .await?
        .ok_or_else(|| DomainError::IdTagNotFound(request.id_tag.clone()))?;

    let new_session = NewSession {
        transaction_id: 0, // allocated by the repository
        charge_point_id: cp_id.to_string(),
        id_tag_id: id_tag_row.id,
        connector_id: request.connector_id,
        meter_start: request.meter_start as i64,
        start_timestamp: request.timestamp.naive_utc(),
        reservation_id: None,
    };

    let session = match sessions.create(new_session).await {
        Ok(session) => session,
        Err(e) => {
            // Per the spec: a failed insertion (connector already occupied,
            // transaction-id allocation exhausted, ...) degrades to Invalid
            // rather than surfacing as a CallError.
            warn!(cp_id, error = %e, "StartTransaction: session insertion failed");
            let response = StartTransactionResponse {
                transaction_id: 0,
                id_tag_info: WireIdTagInfo {
                    status: AuthorizationStatus::Invalid,
                    expiry_date: None,
                    parent_id_tag: None,
                },
            };
            return serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()));
        }
    };

    info!(
        cp_id,
        transaction_id = session.transaction_id,
        connector_id = request.connector_id,
        "StartTransaction"
    );

    let response = StartTransactionResponse {
        transaction_id: session.transaction_id,
        id_tag_info: to_wire_id_tag_info(&info),
    };
    serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()))
}
