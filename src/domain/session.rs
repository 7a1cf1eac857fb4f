//! Charging session (OCPP "transaction") domain entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Local,
    Remote,
    EmergencyStop,
    EVDisconnected,
    HardReset,
    SoftReset,
    PowerLoss,
    Reboot,
    DeAuthorized,
    Other,
    UnlockCommand,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl StopReason {
    pub fn parse(s: &str) -> Self {
        match s {
            "Remote" => Self::Remote,
            "EmergencyStop" => Self::EmergencyStop,
            "EVDisconnected" => Self::EVDisconnected,
            "HardReset" => Self::HardReset,
            "SoftReset" => Self::SoftReset,
            "PowerLoss" => Self::PowerLoss,
            "Reboot" => Self::Reboot,
            "DeAuthorized" => Self::DeAuthorized,
            "UnlockCommand" => Self::UnlockCommand,
            "Other" => Self::Other,
            _ => Self::Local,
        }
    }
}

/// One charging session, spanning a StartTransaction/StopTransaction pair.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i32,
    pub transaction_id: i32,
    pub charge_point_id: String,
    pub id_tag_id: i32,
    pub connector_id: i32,
    pub meter_start: i64,
    pub meter_stop: Option<i64>,
    pub start_timestamp: NaiveDateTime,
    pub stop_timestamp: Option<NaiveDateTime>,
    pub status: SessionStatus,
    pub stop_reason: Option<StopReason>,
    pub energy_consumed: Option<f64>,
    pub cost: Option<f64>,
    pub reservation_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Session {
    /// Energy consumed in kWh, per §3's invariant.
    pub fn compute_energy_consumed(meter_start: i64, meter_stop: i64) -> f64 {
        (meter_stop - meter_start) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_consumed_matches_invariant() {
        assert_eq!(Session::compute_energy_consumed(1000, 16000), 15.0);
    }
}
