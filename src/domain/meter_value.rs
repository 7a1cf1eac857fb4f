//! Sampled meter reading domain entity.

use chrono::NaiveDateTime;

/// A single sampled value out of a `MeterValues.req`'s `sampledValue` array.
#[derive(Debug, Clone)]
pub struct MeterValue {
    pub id: i32,
    pub session_id: Option<i32>,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub unit: String,
    pub measurand: String,
    pub phase: Option<String>,
    pub location: String,
    pub context: String,
    pub format: String,
    pub created_at: NaiveDateTime,
}

/// A new meter value row prior to insertion; defaults mirror §3.
#[derive(Debug, Clone)]
pub struct NewMeterValue {
    pub session_id: Option<i32>,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub unit: String,
    pub measurand: String,
    pub phase: Option<String>,
    pub location: String,
    pub context: String,
    pub format: String,
}

impl NewMeterValue {
    pub fn with_defaults(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            session_id: None,
            timestamp,
            value,
            unit: "Wh".to_string(),
            measurand: "Energy.Active.Import.Register".to_string(),
            phase: None,
            location: "Outlet".to_string(),
            context: "Sample.Periodic".to_string(),
            format: "Raw".to_string(),
        }
    }
}
