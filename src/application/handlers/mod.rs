//! Per-action domain handlers (C6). Each module exposes a single `handle`
//! function taking the repositories it needs, the sending charge point's
//! id, and the decoded JSON payload, and returns the JSON payload to answer
//! with.

pub mod authorize;
pub mod boot_notification;
pub mod heartbeat;
pub mod meter_values;
mod sampled_value;
pub mod start_transaction;
pub mod status_notification;
pub mod stop_transaction;
