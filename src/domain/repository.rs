//! Persistence repository trait (C2).
//!
//! A narrow interface over the entities of §3 of the specification.
//! Exactly one implementation ships with this crate ([`crate::infrastructure`]),
//! backed by SeaORM; the trait boundary is what keeps the storage engine
//! pluggable.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::charge_point::{BootNotificationFields, ChargePoint, OcppStatus};
use super::connector_status::NewConnectorStatus;
use super::error::DomainResult;
use super::id_tag::IdTag;
use super::meter_value::NewMeterValue;
use super::session::{Session, StopReason};

/// Fields needed to insert a new [`Session`] row at StartTransaction time.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub transaction_id: i32,
    pub charge_point_id: String,
    pub id_tag_id: i32,
    pub connector_id: i32,
    pub meter_start: i64,
    pub start_timestamp: NaiveDateTime,
    pub reservation_id: Option<i32>,
}

/// Fields applied by StopTransaction.
#[derive(Debug, Clone)]
pub struct SessionStop {
    pub meter_stop: i64,
    pub stop_timestamp: NaiveDateTime,
    pub stop_reason: StopReason,
    pub energy_consumed: f64,
}

#[async_trait]
pub trait ChargePointRepository: Send + Sync {
    async fn get(&self, id: &str) -> DomainResult<Option<ChargePoint>>;

    /// Upsert on BootNotification: creates the row if absent, otherwise
    /// updates the provided fields. Always sets `is_online`, `last_seen`,
    /// and `boot_status`.
    async fn upsert_boot_notification(
        &self,
        id: &str,
        fields: BootNotificationFields,
        now: NaiveDateTime,
    ) -> DomainResult<ChargePoint>;

    async fn touch_heartbeat(&self, id: &str, now: NaiveDateTime) -> DomainResult<bool>;

    async fn set_online(&self, id: &str, online: bool, now: NaiveDateTime) -> DomainResult<()>;

    async fn set_status(&self, id: &str, status: OcppStatus, now: NaiveDateTime) -> DomainResult<()>;
}

#[async_trait]
pub trait IdTagRepository: Send + Sync {
    async fn get(&self, tag: &str) -> DomainResult<Option<IdTag>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Resolve the id tag, allocate a transaction id, and insert the
    /// session row in a single transaction (§4.6).
    async fn create(&self, new_session: NewSession) -> DomainResult<Session>;

    async fn get_by_transaction_id(&self, transaction_id: i32) -> DomainResult<Option<Session>>;

    async fn get_active(
        &self,
        charge_point_id: &str,
        connector_id: i32,
    ) -> DomainResult<Option<Session>>;

    async fn stop(&self, transaction_id: i32, stop: SessionStop) -> DomainResult<Option<Session>>;

    async fn is_transaction_id_taken(&self, transaction_id: i32) -> DomainResult<bool>;
}

#[async_trait]
pub trait MeterValueRepository: Send + Sync {
    async fn append(&self, value: NewMeterValue) -> DomainResult<()>;
}

#[async_trait]
pub trait ConnectorStatusRepository: Send + Sync {
    async fn append(&self, status: NewConnectorStatus) -> DomainResult<()>;
}

/// Aggregates the narrow per-entity repositories behind one handle that the
/// application layer can hold and clone cheaply.
pub trait RepositoryProvider:
    ChargePointRepository
    + IdTagRepository
    + SessionRepository
    + MeterValueRepository
    + ConnectorStatusRepository
{
}

impl<T> RepositoryProvider for T where
    T: ChargePointRepository
        + IdTagRepository
        + SessionRepository
        + MeterValueRepository
        + ConnectorStatusRepository
{
}
