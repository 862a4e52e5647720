use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Facility::Table)
                    .if_not_exists()
                    .col(uuid(Facility::Id).primary_key())
                    .col(string_len(Facility::Name, 100).not_null().unique_key())
                    .col(
                        integer(Facility::Quantity)
                            .not_null()
                            .check(Expr::col(Facility::Quantity).gte(0)),
                    )
                    .col(
                        timestamp_with_time_zone(Facility::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Facility::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Facility::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Facility {
    Table,
    Id,
    Name,
    Quantity,
    CreatedAt,
    UpdatedAt,
}
