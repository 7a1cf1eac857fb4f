//! Charge Point domain entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OCPP 1.6 connector/charge-point operational status, as reported by
/// `StatusNotification` (and mirrored onto the charge point row for
/// connector 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcppStatus {
    Unknown,
    Available,
    Preparing,
    Charging,
    SuspendedEV,
    SuspendedEVSE,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

impl Default for OcppStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for OcppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl OcppStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Preparing" => Self::Preparing,
            "Charging" => Self::Charging,
            "SuspendedEV" => Self::SuspendedEV,
            "SuspendedEVSE" => Self::SuspendedEVSE,
            "Finishing" => Self::Finishing,
            "Reserved" => Self::Reserved,
            "Unavailable" => Self::Unavailable,
            "Faulted" => Self::Faulted,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of the most recent BootNotification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for BootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A registered charging station.
#[derive(Debug, Clone)]
pub struct ChargePoint {
    pub id: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub charge_point_serial_number: Option<String>,
    pub charge_box_serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub meter_type: Option<String>,
    pub meter_serial_number: Option<String>,
    pub status: OcppStatus,
    pub last_seen: Option<NaiveDateTime>,
    pub is_online: bool,
    pub boot_status: BootStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields carried by a BootNotification, used to upsert a [`ChargePoint`].
#[derive(Debug, Clone, Default)]
pub struct BootNotificationFields {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub charge_point_serial_number: Option<String>,
    pub charge_box_serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub meter_type: Option<String>,
    pub meter_serial_number: Option<String>,
}
