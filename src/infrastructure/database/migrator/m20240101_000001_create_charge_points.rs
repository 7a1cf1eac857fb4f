//! Create charge_points table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargePoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargePoints::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChargePoints::Vendor).string())
                    .col(ColumnDef::new(ChargePoints::Model).string())
                    .col(ColumnDef::new(ChargePoints::ChargePointSerialNumber).string())
                    .col(ColumnDef::new(ChargePoints::ChargeBoxSerialNumber).string())
                    .col(ColumnDef::new(ChargePoints::FirmwareVersion).string())
                    .col(ColumnDef::new(ChargePoints::Iccid).string())
                    .col(ColumnDef::new(ChargePoints::Imsi).string())
                    .col(ColumnDef::new(ChargePoints::MeterType).string())
                    .col(ColumnDef::new(ChargePoints::MeterSerialNumber).string())
                    .col(
                        ColumnDef::new(ChargePoints::Status)
                            .string()
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ChargePoints::BootStatus)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(ChargePoints::IsOnline)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ChargePoints::LastSeen).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ChargePoints::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargePoints::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargePoints::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargePoints {
    Table,
    Id,
    Vendor,
    Model,
    ChargePointSerialNumber,
    ChargeBoxSerialNumber,
    FirmwareVersion,
    Iccid,
    Imsi,
    MeterType,
    MeterSerialNumber,
    Status,
    BootStatus,
    IsOnline,
    LastSeen,
    CreatedAt,
    UpdatedAt,
}
