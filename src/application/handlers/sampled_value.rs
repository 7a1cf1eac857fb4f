//! Shared sampled-value decoding for MeterValues and StopTransaction's
//! `transactionData` (§3/§4.4): both turn a `rust_ocpp` `SampledValue` into
//! a [`NewMeterValue`]. The stored `unit`/`measurand`/`phase`/`location`/
//! `context` strings are taken from the same `Serialize` impl the wire
//! payload itself uses, rather than `Debug`-formatted, so a value like
//! `Energy.Active.Import.Register` round-trips intact instead of losing its
//! dots to Rust's identifier-shaped `Debug` output.

use chrono::NaiveDateTime;
use rust_ocpp::v1_6::types::SampledValue;

use crate::domain::NewMeterValue;

fn wire_string<T: serde::Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}

/// Decode one `sampledValue` entry, or `None` if its `value` isn't numeric
/// (§4.4: non-numeric samples are skipped by the caller, which logs it).
pub fn decode(timestamp: NaiveDateTime, sampled: &SampledValue) -> Option<NewMeterValue> {
    let value = sampled.value.parse::<f64>().ok()?;
    let mut new_value = NewMeterValue::with_defaults(timestamp, value);

    if let Some(unit) = &sampled.unit {
        if let Some(s) = wire_string(unit) {
            new_value.unit = s;
        }
    }
    if let Some(measurand) = &sampled.measurand {
        if let Some(s) = wire_string(measurand) {
            new_value.measurand = s;
        }
    }
    if let Some(phase) = &sampled.phase {
        new_value.phase = wire_string(phase);
    }
    if let Some(location) = &sampled.location {
        if let Some(s) = wire_string(location) {
            new_value.location = s;
        }
    }
    if let Some(context) = &sampled.context {
        if let Some(s) = wire_string(context) {
            new_value.context = s;
        }
    }

    Some(new_value)
}
