//! SeaORM implementation of the domain repository traits (C2).
//!
//! One struct, one connection, all five traits — the domain layer only
//! ever sees it through `Arc<dyn RepositoryProvider>`.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::warn;

use crate::domain::{
    BootNotificationFields, BootStatus, ChargePoint, ChargePointRepository,
    ConnectorStatusRepository, DomainError, DomainResult, IdTag, IdTagRepository, IdTagStatus,
    MeterValueRepository, NewConnectorStatus, NewMeterValue, NewSession, OcppStatus, Session,
    SessionRepository, SessionStatus, SessionStop, StopReason,
};

use super::entities::{charge_point, connector_status, id_tag, meter_value, session};

const TRANSACTION_ID_MIN: i32 = 100_000;
const TRANSACTION_ID_MAX: i32 = 999_999;
const TRANSACTION_ID_MAX_ATTEMPTS: u32 = 25;

pub struct SeaOrmRepositories {
    db: DatabaseConnection,
}

impl SeaOrmRepositories {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_utc(naive: NaiveDateTime) -> chrono::DateTime<Utc> {
    naive.and_utc()
}

fn cp_from_model(model: charge_point::Model) -> ChargePoint {
    ChargePoint {
        id: model.id,
        vendor: model.vendor,
        model: model.model,
        charge_point_serial_number: model.charge_point_serial_number,
        charge_box_serial_number: model.charge_box_serial_number,
        firmware_version: model.firmware_version,
        iccid: model.iccid,
        imsi: model.imsi,
        meter_type: model.meter_type,
        meter_serial_number: model.meter_serial_number,
        status: OcppStatus::parse(&model.status),
        last_seen: model.last_seen.map(|t| t.naive_utc()),
        is_online: model.is_online,
        boot_status: match model.boot_status.as_str() {
            "Accepted" => BootStatus::Accepted,
            "Rejected" => BootStatus::Rejected,
            _ => BootStatus::Pending,
        },
        created_at: model.created_at.naive_utc(),
        updated_at: model.updated_at.naive_utc(),
    }
}

fn id_tag_from_model(model: id_tag::Model) -> IdTag {
    IdTag {
        id: model.id,
        tag: model.tag,
        status: match model.status.as_str() {
            "Blocked" => IdTagStatus::Blocked,
            "Expired" => IdTagStatus::Expired,
            "Invalid" => IdTagStatus::Invalid,
            _ => IdTagStatus::Accepted,
        },
        user_name: model.user_name,
        user_email: model.user_email,
        expiry_date: model.expiry_date.map(|t| t.naive_utc()),
        parent_id_tag: model.parent_id_tag,
        created_at: model.created_at.naive_utc(),
        updated_at: model.updated_at.naive_utc(),
    }
}

fn session_from_model(model: session::Model) -> Session {
    Session {
        id: model.id,
        transaction_id: model.transaction_id,
        charge_point_id: model.charge_point_id,
        id_tag_id: model.id_tag_id,
        connector_id: model.connector_id,
        meter_start: model.meter_start,
        meter_stop: model.meter_stop,
        start_timestamp: model.start_timestamp.naive_utc(),
        stop_timestamp: model.stop_timestamp.map(|t| t.naive_utc()),
        status: match model.status.as_str() {
            "Completed" => SessionStatus::Completed,
            _ => SessionStatus::Active,
        },
        stop_reason: model.stop_reason.as_deref().map(StopReason::parse),
        energy_consumed: model.energy_consumed,
        cost: model.cost,
        reservation_id: model.reservation_id,
        created_at: model.created_at.naive_utc(),
        updated_at: model.updated_at.naive_utc(),
    }
}

#[async_trait]
impl ChargePointRepository for SeaOrmRepositories {
    async fn get(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        let model = charge_point::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(cp_from_model))
    }

    async fn upsert_boot_notification(
        &self,
        id: &str,
        fields: BootNotificationFields,
        now: NaiveDateTime,
    ) -> DomainResult<ChargePoint> {
        let now = to_utc(now);
        let existing = charge_point::Entity::find_by_id(id).one(&self.db).await?;

        let model = if let Some(existing) = existing {
            let mut active: charge_point::ActiveModel = existing.into();
            active.vendor = Set(fields.vendor);
            active.model = Set(fields.model);
            active.charge_point_serial_number = Set(fields.charge_point_serial_number);
            active.charge_box_serial_number = Set(fields.charge_box_serial_number);
            active.firmware_version = Set(fields.firmware_version);
            active.iccid = Set(fields.iccid);
            active.imsi = Set(fields.imsi);
            active.meter_type = Set(fields.meter_type);
            active.meter_serial_number = Set(fields.meter_serial_number);
            active.boot_status = Set(BootStatus::Accepted.to_string());
            active.is_online = Set(true);
            active.last_seen = Set(Some(now));
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            let active = charge_point::ActiveModel {
                id: Set(id.to_string()),
                vendor: Set(fields.vendor),
                model: Set(fields.model),
                charge_point_serial_number: Set(fields.charge_point_serial_number),
                charge_box_serial_number: Set(fields.charge_box_serial_number),
                firmware_version: Set(fields.firmware_version),
                iccid: Set(fields.iccid),
                imsi: Set(fields.imsi),
                meter_type: Set(fields.meter_type),
                meter_serial_number: Set(fields.meter_serial_number),
                status: Set(OcppStatus::Unknown.to_string()),
                boot_status: Set(BootStatus::Accepted.to_string()),
                is_online: Set(true),
                last_seen: Set(Some(now)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(&self.db).await?
        };

        Ok(cp_from_model(model))
    }

    async fn touch_heartbeat(&self, id: &str, now: NaiveDateTime) -> DomainResult<bool> {
        let Some(existing) = charge_point::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(false);
        };
        let mut active: charge_point::ActiveModel = existing.into();
        active.last_seen = Set(Some(to_utc(now)));
        active.updated_at = Set(to_utc(now));
        active.update(&self.db).await?;
        Ok(true)
    }

    async fn set_online(&self, id: &str, online: bool, now: NaiveDateTime) -> DomainResult<()> {
        let Some(existing) = charge_point::Entity::find_by_id(id).one(&self.db).await? else {
            warn!(id, "set_online on an unregistered charge point");
            return Ok(());
        };
        let mut active: charge_point::ActiveModel = existing.into();
        active.is_online = Set(online);
        active.updated_at = Set(to_utc(now));
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_status(&self, id: &str, status: OcppStatus, now: NaiveDateTime) -> DomainResult<()> {
        let Some(existing) = charge_point::Entity::find_by_id(id).one(&self.db).await? else {
            warn!(id, "set_status on an unregistered charge point");
            return Ok(());
        };
        let mut active: charge_point::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(to_utc(now));
        active.update(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl IdTagRepository for SeaOrmRepositories {
    async fn get(&self, tag: &str) -> DomainResult<Option<IdTag>> {
        let model = id_tag::Entity::find()
            .filter(id_tag::Column::Tag.eq(tag))
            .one(&self.db)
            .await?;
        Ok(model.map(id_tag_from_model))
    }
}

#[async_trait]
impl SessionRepository for SeaOrmRepositories {
    async fn create(&self, new_session: NewSession) -> DomainResult<Session> {
        let txn = self.db.begin().await?;

        let already_active = session::Entity::find()
            .filter(session::Column::ChargePointId.eq(&new_session.charge_point_id))
            .filter(session::Column::ConnectorId.eq(new_session.connector_id))
            .filter(session::Column::Status.eq("Active"))
            .one(&txn)
            .await?
            .is_some();
        if already_active {
            return Err(DomainError::ConnectorOccupied(
                new_session.charge_point_id,
                new_session.connector_id,
            ));
        }

        let mut transaction_id = 0;
        let mut attempts = 0;
        loop {
            let candidate = rand::thread_rng().gen_range(TRANSACTION_ID_MIN..=TRANSACTION_ID_MAX);
            let taken = session::Entity::find()
                .filter(session::Column::TransactionId.eq(candidate))
                .one(&txn)
                .await?
                .is_some();
            if !taken {
                transaction_id = candidate;
                break;
            }
            attempts += 1;
            if attempts >= TRANSACTION_ID_MAX_ATTEMPTS {
                return Err(DomainError::Storage(
                    "exhausted attempts allocating a unique transaction id".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let active = session::ActiveModel {
            id: NotSet,
            transaction_id: Set(transaction_id),
            charge_point_id: Set(new_session.charge_point_id),
            id_tag_id: Set(new_session.id_tag_id),
            connector_id: Set(new_session.connector_id),
            meter_start: Set(new_session.meter_start),
            meter_stop: Set(None),
            start_timestamp: Set(to_utc(new_session.start_timestamp)),
            stop_timestamp: Set(None),
            status: Set(SessionStatus::Active.to_string()),
            stop_reason: Set(None),
            energy_consumed: Set(None),
            cost: Set(None),
            reservation_id: Set(new_session.reservation_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&txn).await?;
        txn.commit().await?;

        Ok(session_from_model(model))
    }

    async fn get_by_transaction_id(&self, transaction_id: i32) -> DomainResult<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await?;
        Ok(model.map(session_from_model))
    }

    async fn get_active(
        &self,
        charge_point_id: &str,
        connector_id: i32,
    ) -> DomainResult<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::ChargePointId.eq(charge_point_id))
            .filter(session::Column::ConnectorId.eq(connector_id))
            .filter(session::Column::Status.eq("Active"))
            .one(&self.db)
            .await?;
        Ok(model.map(session_from_model))
    }

    async fn stop(&self, transaction_id: i32, stop: SessionStop) -> DomainResult<Option<Session>> {
        let Some(existing) = session::Entity::find()
            .filter(session::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active: session::ActiveModel = existing.into();
        active.meter_stop = Set(Some(stop.meter_stop));
        active.stop_timestamp = Set(Some(to_utc(stop.stop_timestamp)));
        active.status = Set(SessionStatus::Completed.to_string());
        active.stop_reason = Set(Some(stop.stop_reason.to_string()));
        active.energy_consumed = Set(Some(stop.energy_consumed));
        active.updated_at = Set(Utc::now());
        let model = active.update(&self.db).await?;

        Ok(Some(session_from_model(model)))
    }

    async fn is_transaction_id_taken(&self, transaction_id: i32) -> DomainResult<bool> {
        let exists = session::Entity::find()
            .filter(session::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await?
            .is_some();
        Ok(exists)
    }
}

#[async_trait]
impl MeterValueRepository for SeaOrmRepositories {
    async fn append(&self, value: NewMeterValue) -> DomainResult<()> {
        let active = meter_value::ActiveModel {
            id: NotSet,
            session_id: Set(value.session_id),
            timestamp: Set(to_utc(value.timestamp)),
            value: Set(value.value),
            unit: Set(value.unit),
            measurand: Set(value.measurand),
            phase: Set(value.phase),
            location: Set(value.location),
            context: Set(value.context),
            format: Set(value.format),
            created_at: Set(Utc::now()),
        };
        active.insert(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl ConnectorStatusRepository for SeaOrmRepositories {
    async fn append(&self, status: NewConnectorStatus) -> DomainResult<()> {
        let active = connector_status::ActiveModel {
            id: NotSet,
            charge_point_id: Set(status.charge_point_id),
            connector_id: Set(status.connector_id),
            status: Set(status.status.to_string()),
            error_code: Set(status.error_code),
            timestamp: Set(status.timestamp.map(to_utc)),
            info: Set(status.info),
            vendor_id: Set(status.vendor_id),
            vendor_error_code: Set(status.vendor_error_code),
            created_at: Set(Utc::now()),
        };
        active.insert(&self.db).await?;
        Ok(())
    }
}
