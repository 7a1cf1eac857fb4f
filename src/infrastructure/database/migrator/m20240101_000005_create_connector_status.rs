//! Create connector_status table.

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
                    .table(ConnectorStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectorStatus::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConnectorStatus::ChargePointId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectorStatus::ConnectorId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConnectorStatus::Status).string().not_null())
                    .col(
                        ColumnDef::new(ConnectorStatus::ErrorCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConnectorStatus::Timestamp).timestamp_with_time_zone())
                    .col(ColumnDef::new(ConnectorStatus::Info).string())
                    .col(ColumnDef::new(ConnectorStatus::VendorId).string())
                    .col(ColumnDef::new(ConnectorStatus::VendorErrorCode).string())
                    .col(
                        ColumnDef::new(ConnectorStatus::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ConnectorStatus::Table, ConnectorStatus::ChargePointId)
                            .to(ChargePoints::Table, ChargePoints::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectorStatus::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ConnectorStatus {
    Table,
    Id,
    ChargePointId,
    ConnectorId,
    Status,
    ErrorCode,
    Timestamp,
    Info,
    VendorId,
    VendorErrorCode,
    CreatedAt,
}
