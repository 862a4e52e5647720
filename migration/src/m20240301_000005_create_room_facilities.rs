use sea_orm_migration::{prelude::*, schema::*};

use super::m20240301_000002_create_rooms::Room;
use super::m20240301_000003_create_facilities::Facility;
use super::m20240301_000004_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoomFacility::Table)
                    .if_not_exists()
                    .col(uuid(RoomFacility::Id).primary_key())
                    .col(uuid(RoomFacility::RoomId).not_null())
                    .col(uuid(RoomFacility::FacilityId).not_null())
                    // NULL for standalone assignments made by an administrator
                    .col(uuid_null(RoomFacility::BookingId))
                    .col(integer(RoomFacility::Quantity).not_null())
                    .col(text(RoomFacility::Description).not_null())
                    .col(
                        timestamp_with_time_zone(RoomFacility::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(RoomFacility::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_room_facility_room")
                            .from(RoomFacility::Table, RoomFacility::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_room_facility_facility")
                            .from(RoomFacility::Table, RoomFacility::FacilityId)
                            .to(Facility::Table, Facility::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_room_facility_booking")
                            .from(RoomFacility::Table, RoomFacility::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_room_facility_booking")
                    .table(RoomFacility::Table)
                    .col(RoomFacility::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomFacility::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RoomFacility {
    Table,
    Id,
    RoomId,
    FacilityId,
    BookingId,
    Quantity,
    Description,
    CreatedAt,
    UpdatedAt,
}
