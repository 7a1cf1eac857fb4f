//! Create id_tags table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdTags::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IdTags::Tag).string().not_null())
                    .col(
                        ColumnDef::new(IdTags::Status)
                            .string()
                            .not_null()
                            .default("Accepted"),
                    )
                    .col(ColumnDef::new(IdTags::UserName).string())
                    .col(ColumnDef::new(IdTags::UserEmail).string())
                    .col(ColumnDef::new(IdTags::ExpiryDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(IdTags::ParentIdTag).string())
                    .col(
                        ColumnDef::new(IdTags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdTags::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_id_tags_tag")
                    .table(IdTags::Table)
                    .col(IdTags::Tag)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdTags::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum IdTags {
    Table,
    Id,
    Tag,
    Status,
    UserName,
    UserEmail,
    ExpiryDate,
    ParentIdTag,
    CreatedAt,
    UpdatedAt,
}
