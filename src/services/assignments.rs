//! Standalone facility assignments: an administrator attaches facility units
//! to a room outside of any booking, or re-sizes an existing reservation.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::run_in_transaction;
use crate::entities::{room, room_facility};
use crate::error::{AppError, AppResult};
use crate::services::ledger;
use crate::utils::pagination::{PageRequest, Paging};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub room_id: Uuid,
    pub facility_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub description: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct AllocationPatch {
    pub room_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub description: Option<String>,
}

pub async fn create_assignment(
    db: &DatabaseConnection,
    request: NewAssignment,
) -> AppResult<room_facility::Model> {
    let allocation = run_in_transaction(db, "create_assignment", move |txn| {
        Box::pin(async move {
            ensure_room_exists(txn, request.room_id).await?;

            let available = ledger::read_quantity(txn, request.facility_id).await?;
            if request.quantity > available {
                tracing::warn!(
                    facility_id = %request.facility_id,
                    requested = request.quantity,
                    available,
                    "Not enough stock for assignment"
                );
                return Err(AppError::InsufficientStock {
                    facility_id: request.facility_id,
                    requested: request.quantity,
                    available,
                });
            }

            let now: DateTimeWithTimeZone = Utc::now().into();
            let allocation = room_facility::ActiveModel {
                id: Set(Uuid::new_v4()),
                room_id: Set(request.room_id),
                facility_id: Set(request.facility_id),
                booking_id: Set(None),
                quantity: Set(request.quantity),
                description: Set(request.description),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(txn)
            .await?;

            ledger::apply_delta(
                txn,
                request.facility_id,
                available,
                available - request.quantity,
            )
            .await?;

            Ok(allocation)
        })
    })
    .await?;

    tracing::info!(
        allocation_id = %allocation.id,
        room_id = %allocation.room_id,
        facility_id = %allocation.facility_id,
        quantity = allocation.quantity,
        "Facility assigned"
    );
    Ok(allocation)
}

/// Partially update an allocation and rebalance the stock it holds.
pub async fn update_assignment(
    db: &DatabaseConnection,
    allocation_id: Uuid,
    patch: AllocationPatch,
) -> AppResult<room_facility::Model> {
    let updated = run_in_transaction(db, "update_assignment", move |txn| {
        Box::pin(async move {
            let current = room_facility::Entity::find_by_id(allocation_id)
                .lock_exclusive()
                .one(txn)
                .await?
                .ok_or_else(|| allocation_not_found(allocation_id))?;

            let room_id = patch.room_id.unwrap_or(current.room_id);
            if room_id != current.room_id {
                ensure_room_exists(txn, room_id).await?;
            }
            let facility_id = patch.facility_id.unwrap_or(current.facility_id);
            let quantity = patch.quantity.unwrap_or(current.quantity);
            let description = patch
                .description
                .unwrap_or_else(|| current.description.clone());

            let available = ledger::read_quantity(txn, facility_id).await?;

            let moved = facility_id != current.facility_id;
            let change = if moved {
                // Old units go back to the old facility, the new facility pays in full
                if quantity > available {
                    return Err(AppError::InsufficientStock {
                        facility_id,
                        requested: quantity,
                        available,
                    });
                }
                ledger::StockChange::SetTo {
                    expected: available,
                    quantity: available - quantity,
                }
            } else {
                ledger::plan_rebalance(facility_id, current.quantity, patch.quantity, available)?
            };

            let previous_facility = current.facility_id;
            let previous_quantity = current.quantity;

            let mut active: room_facility::ActiveModel = current.into();
            active.room_id = Set(room_id);
            active.facility_id = Set(facility_id);
            active.quantity = Set(quantity);
            active.description = Set(description);
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(txn).await?;

            if moved {
                ledger::release(txn, previous_facility, previous_quantity).await?;
            }
            change.apply(txn, facility_id).await?;

            tracing::debug!(%allocation_id, ?change, moved, "Allocation rebalanced");
            Ok(updated)
        })
    })
    .await?;

    tracing::info!(
        allocation_id = %updated.id,
        facility_id = %updated.facility_id,
        quantity = updated.quantity,
        "Facility assignment updated"
    );
    Ok(updated)
}

pub async fn get_assignment(
    db: &DatabaseConnection,
    allocation_id: Uuid,
) -> AppResult<room_facility::Model> {
    room_facility::Entity::find_by_id(allocation_id)
        .one(db)
        .await?
        .ok_or_else(|| allocation_not_found(allocation_id))
}

/// Every allocation, standalone and booking-owned, newest first.
pub async fn list_assignments(
    db: &DatabaseConnection,
    page: PageRequest,
) -> AppResult<(Vec<room_facility::Model>, Paging)> {
    let paginator = room_facility::Entity::find()
        .order_by_desc(room_facility::Column::CreatedAt)
        .order_by_asc(room_facility::Column::Id)
        .paginate(db, page.size);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.index()).await?;
    Ok((rows, Paging::new(page, total)))
}

async fn ensure_room_exists<C>(conn: &C, room_id: Uuid) -> AppResult<()>
where
    C: ConnectionTrait,
{
    room::Entity::find_by_id(room_id)
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
}

fn allocation_not_found(allocation_id: Uuid) -> AppError {
    AppError::NotFound(format!("Room facility {} not found", allocation_id))
}
