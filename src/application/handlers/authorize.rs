//! Authorize (C6) — also the shared id-tag predicate used by StartTransaction
//! and the C7 RemoteStart/RemoteStop pre-validation.

use chrono::Utc;
use rust_ocpp::v1_6::messages::authorize::{AuthorizeRequest, AuthorizeResponse};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo as WireIdTagInfo};
use serde_json::Value;

use crate::domain::{resolve_id_tag, DomainError, IdTagInfo, IdTagRepository, IdTagStatus};

fn wire_status(status: IdTagStatus) -> AuthorizationStatus {
    match status {
        IdTagStatus::Accepted => AuthorizationStatus::Accepted,
        IdTagStatus::Blocked => AuthorizationStatus::Blocked,
        IdTagStatus::Expired => AuthorizationStatus::Expired,
        IdTagStatus::Invalid => AuthorizationStatus::Invalid,
    }
}

pub fn to_wire_id_tag_info(info: &IdTagInfo) -> WireIdTagInfo {
    WireIdTagInfo {
        status: wire_status(info.status),
        expiry_date: info.expiry_date.map(|dt| dt.and_utc()),
        parent_id_tag: info.parent_id_tag.clone(),
    }
}

/// Resolve `id_tag` per §4.4's Authorize predicate. Any storage error
/// degrades to Invalid (§7, storage-error policy for read handlers).
pub async fn resolve(id_tags: &dyn IdTagRepository, id_tag: &str) -> IdTagInfo {
    let now = Utc::now().naive_utc();
    match id_tags.get(id_tag).await {
        Ok(row) => resolve_id_tag(row.as_ref(), now),
        Err(_) => IdTagInfo {
            status: IdTagStatus::Invalid,
            expiry_date: None,
            parent_id_tag: None,
        },
    }
}

pub async fn handle(
    id_tags: &dyn IdTagRepository,
    _cp_id: &str,
    payload: Value,
) -> Result<Value, DomainError> {
    let request: AuthorizeRequest =
        serde_json::from_value(payload).map_err(|e| DomainError::InvalidPayload(e.to_string()))?;

    let info = resolve(id_tags, &request.id_tag).await;
    let response = AuthorizeResponse {
        id_tag_info: to_wire_id_tag_info(&info),
    };

    serde_json::to_value(&response).map_err(|e| DomainError::Storage(e.to_string()))
}
