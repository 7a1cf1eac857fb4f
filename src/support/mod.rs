//! Cross-cutting utilities: time, wire framing, shutdown coordination.

pub mod ocpp_frame;
pub mod shutdown;
pub mod time;

pub use ocpp_frame::{OcppFrame, OcppFrameError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
