//! Domain layer: core entities, the authorize predicate, and the
//! persistence repository trait (C2).

pub mod charge_point;
pub mod connector_status;
pub mod error;
pub mod id_tag;
pub mod meter_value;
pub mod repository;
pub mod session;

pub use charge_point::{BootNotificationFields, BootStatus, ChargePoint, OcppStatus};
pub use connector_status::{ConnectorStatusRecord, NewConnectorStatus};
pub use error::{DomainError, DomainResult};
pub use id_tag::{resolve_id_tag, IdTag, IdTagInfo, IdTagStatus};
pub use meter_value::{MeterValue, NewMeterValue};
pub use repository::{
    ChargePointRepository, ConnectorStatusRepository, IdTagRepository, MeterValueRepository,
    NewSession, RepositoryProvider, SessionRepository, SessionStop,
};
pub use session::{Session, SessionStatus, StopReason};
