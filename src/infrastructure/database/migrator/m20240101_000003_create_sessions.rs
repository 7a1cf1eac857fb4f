//! Create sessions table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_charge_points::ChargePoints;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::TransactionId).integer().not_null())
                    .col(ColumnDef::new(Sessions::ChargePointId).string().not_null())
                    .col(ColumnDef::new(Sessions::IdTagId).integer().not_null())
                    .col(ColumnDef::new(Sessions::ConnectorId).integer().not_null())
                    .col(ColumnDef::new(Sessions::MeterStart).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::MeterStop).big_integer())
                    .col(
                        ColumnDef::new(Sessions::StartTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::StopTimestamp).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string()
                            .not_null()
                            .default("Active"),
                    )
                    .col(ColumnDef::new(Sessions::StopReason).string())
                    .col(ColumnDef::new(Sessions::EnergyConsumed).double())
                    .col(ColumnDef::new(Sessions::Cost).double())
                    .col(ColumnDef::new(Sessions::ReservationId).integer())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Sessions::Table, Sessions::ChargePointId)
                            .to(ChargePoints::Table, ChargePoints::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_transaction_id")
                    .table(Sessions::Table)
                    .col(Sessions::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Sessions {
    Table,
    Id,
    TransactionId,
    ChargePointId,
    IdTagId,
    ConnectorId,
    MeterStart,
    MeterStop,
    StartTimestamp,
    StopTimestamp,
    Status,
    StopReason,
    EnergyConsumed,
    Cost,
    ReservationId,
    CreatedAt,
    UpdatedAt,
}
