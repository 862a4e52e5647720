use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect};
use uuid::Uuid;

use crate::entities::room::{self, STATUS_AVAILABLE};
use crate::error::{AppError, AppResult};

pub fn is_bookable(status: &str) -> bool {
    status == STATUS_AVAILABLE
}

pub async fn status_of<C>(conn: &C, room_id: Uuid) -> AppResult<String>
where
    C: ConnectionTrait,
{
    room::Entity::find_by_id(room_id)
        .select_only()
        .column(room::Column::Status)
        .into_tuple::<String>()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
}

/// Fails with `RoomUnavailable` unless the room is exactly "available".
pub async fn ensure_bookable<C>(conn: &C, room_id: Uuid) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let status = status_of(conn, room_id).await?;
    if !is_bookable(&status) {
        tracing::warn!(%room_id, %status, "Room cannot be booked");
        return Err(AppError::RoomUnavailable { room_id, status });
    }
    Ok(())
}
