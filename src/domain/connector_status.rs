//! Append-only connector status log entity.

use chrono::NaiveDateTime;

use super::charge_point::OcppStatus;

/// One `StatusNotification` record. The current status of a connector is
/// the most-recent row ordered by `created_at` (CP-supplied `timestamp` is
/// a tie-breaker, never the primary ordering).
#[derive(Debug, Clone)]
pub struct ConnectorStatusRecord {
    pub id: i32,
    pub charge_point_id: String,
    pub connector_id: i32,
    pub status: OcppStatus,
    pub error_code: String,
    pub timestamp: Option<NaiveDateTime>,
    pub info: Option<String>,
    pub vendor_id: Option<String>,
    pub vendor_error_code: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewConnectorStatus {
    pub charge_point_id: String,
    pub connector_id: i32,
    pub status: OcppStatus,
    pub error_code: String,
    pub timestamp: Option<NaiveDateTime>,
    pub info: Option<String>,
    pub vendor_id: Option<String>,
    pub vendor_error_code: Option<String>,
}
