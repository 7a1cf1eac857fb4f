//! Create meter_values table.

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_sessions::Sessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MeterValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeterValues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MeterValues::SessionId).integer())
                    .col(
                        ColumnDef::new(MeterValues::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MeterValues::Value).double().not_null())
                    .col(ColumnDef::new(MeterValues::Unit).string().not_null())
                    .col(ColumnDef::new(MeterValues::Measurand).string().not_null())
                    .col(ColumnDef::new(MeterValues::Phase).string())
                    .col(ColumnDef::new(MeterValues::Location).string().not_null())
                    .col(ColumnDef::new(MeterValues::Context).string().not_null())
                    .col(ColumnDef::new(MeterValues::Format).string().not_null())
                    .col(
                        ColumnDef::new(MeterValues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MeterValues::Table, MeterValues::SessionId)
                            .to(Sessions::Table, Sessions::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MeterValues::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MeterValues {
    Table,
    Id,
    SessionId,
    Timestamp,
    Value,
    Unit,
    Measurand,
    Phase,
    Location,
    Context,
    Format,
    CreatedAt,
}
