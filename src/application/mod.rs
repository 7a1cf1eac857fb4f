//! Application layer: the connection registry (C5), Call dispatch (C4),
//! domain handlers (C6), and the operator command facade (C7).

pub mod commands;
pub mod dispatch;
pub mod handlers;
pub mod registry;

pub use dispatch::{dispatch, ProtocolError};
pub use registry::{Connection, Lookup, SessionRegistry};
