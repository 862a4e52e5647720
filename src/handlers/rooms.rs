use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::room::{self, STATUS_AVAILABLE};
use crate::error::{AppError, AppResult};
use crate::utils::pagination::{PageRequest, Paged, Paging};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    pub name: String,
    pub room_type: String,
    pub capacity: i32,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomStatusRequest {
    #[serde(default)]
    pub status: String,
}

impl RoomRequest {
    fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() || self.room_type.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Room name and type are required".to_string(),
            ));
        }
        if self.capacity <= 0 {
            return Err(AppError::BadRequest("Capacity must be positive".to_string()));
        }
        Ok(())
    }
}

/// Missing or blank means "available"; anything else is stored lowercased.
fn normalized_status(status: Option<&str>) -> String {
    match status.map(str::trim) {
        None | Some("") => STATUS_AVAILABLE.to_string(),
        Some(status) => status.to_lowercase(),
    }
}

async fn find_room(state: &AppState, room_id: Uuid) -> AppResult<room::Model> {
    room::Entity::find_by_id(room_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
}

/// Create a room (admin)
pub async fn create_room(
    State(state): State<AppState>,
    Json(payload): Json<RoomRequest>,
) -> AppResult<Json<room::Model>> {
    payload.validate()?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let created = room::ActiveModel {
        id: Set(Uuid::new_v4()),
        status: Set(normalized_status(payload.status.as_deref())),
        name: Set(payload.name),
        room_type: Set(payload.room_type),
        capacity: Set(payload.capacity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(room_id = %created.id, status = %created.status, "Room created");
    Ok(Json(created))
}

/// List rooms, optionally only those with a given status
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<RoomListQuery>,
) -> AppResult<Json<Paged<room::Model>>> {
    let page = PageRequest::new(query.page.unwrap_or(0), query.size.unwrap_or(0))?;

    let mut select = room::Entity::find();
    if let Some(status) = query.status.filter(|s| !s.is_empty()) {
        select = select.filter(room::Column::Status.eq(status));
    }
    let paginator = select
        .order_by_asc(room::Column::Name)
        .paginate(&state.db, page.size);

    let total = paginator.num_items().await?;
    let rooms = paginator.fetch_page(page.index()).await?;

    Ok(Json(Paged::new(rooms, Paging::new(page, total))))
}

/// Get a room by id
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<room::Model>> {
    Ok(Json(find_room(&state, room_id).await?))
}

/// Replace a room's details (admin)
pub async fn update_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<RoomRequest>,
) -> AppResult<Json<room::Model>> {
    payload.validate()?;
    let room = find_room(&state, room_id).await?;

    let mut active: room::ActiveModel = room.into();
    active.status = Set(normalized_status(payload.status.as_deref()));
    active.name = Set(payload.name);
    active.room_type = Set(payload.room_type);
    active.capacity = Set(payload.capacity);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    tracing::info!(%room_id, status = %updated.status, "Room updated");
    Ok(Json(updated))
}

/// Set a room's status (admin, ga)
pub async fn update_room_status(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<UpdateRoomStatusRequest>,
) -> AppResult<Json<room::Model>> {
    let room = find_room(&state, room_id).await?;

    let previous = room.status.clone();
    let mut active: room::ActiveModel = room.into();
    active.status = Set(normalized_status(Some(&payload.status)));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    tracing::info!(%room_id, from = %previous, to = %updated.status, "Room status changed");
    Ok(Json(updated))
}
