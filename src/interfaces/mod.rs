//! Inbound transports. Only the WebSocket OCPP-J server ships in this
//! crate (§1's non-goals exclude a REST/operator surface).

pub mod ws;
