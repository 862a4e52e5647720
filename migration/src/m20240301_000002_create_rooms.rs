use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Room::Table)
                    .if_not_exists()
                    .col(uuid(Room::Id).primary_key())
                    .col(string_len(Room::Name, 100).not_null())
                    .col(string_len(Room::RoomType, 50).not_null())
                    .col(integer(Room::Capacity).not_null())
                    .col(string_len(Room::Status, 30).not_null().default("available"))
                    .col(
                        timestamp_with_time_zone(Room::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Room::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Room::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Room {
    Table,
    Id,
    Name,
    RoomType,
    Capacity,
    Status,
    CreatedAt,
    UpdatedAt,
}
