//! Database entities module.

pub mod charge_point;
pub mod connector_status;
pub mod id_tag;
pub mod meter_value;
pub mod session;

pub use charge_point::Entity as ChargePoint;
pub use connector_status::Entity as ConnectorStatus;
pub use id_tag::Entity as IdTag;
pub use meter_value::Entity as MeterValue;
pub use session::Entity as Session;
