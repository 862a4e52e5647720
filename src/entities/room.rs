use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The only status that admits new bookings.
pub const STATUS_AVAILABLE: &str = "available";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub room_type: String,
    pub capacity: i32,
    /// Free-form ("available", "booked", "maintenance", ...).
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::room_facility::Entity")]
    RoomFacilities,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::room_facility::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomFacilities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
