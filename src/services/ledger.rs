//! Inventory ledger: the per-facility stock counter.
//!
//! Every write to `facility.quantity` goes through this module. Reads take a
//! row lock (`FOR UPDATE` on Postgres) and writes are guarded in SQL, so two
//! transactions can never both spend the same units: a stale write matches no
//! row and is reported instead of silently oversubscribing.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::facility;
use crate::error::{AppError, AppResult};

/// What a partial update does to a facility's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// Leave the counter alone.
    Unchanged,
    /// Move the counter from `expected` to `quantity`.
    SetTo { expected: i32, quantity: i32 },
}

impl StockChange {
    pub async fn apply<C>(self, conn: &C, facility_id: Uuid) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        match self {
            StockChange::Unchanged => Ok(()),
            StockChange::SetTo { expected, quantity } => {
                apply_delta(conn, facility_id, expected, quantity).await
            }
        }
    }
}

/// Stock after changing a reservation from `reserved` to `requested` units
/// while `available` units are free. Handles growth and shrinkage alike.
pub fn rebalanced_quantity(reserved: i32, requested: i32, available: i32) -> i32 {
    reserved - requested + available
}

/// Plan the ledger write for re-sizing an existing reservation on the same
/// facility. `requested = None` means the caller did not touch the quantity.
pub fn plan_rebalance(
    facility_id: Uuid,
    reserved: i32,
    requested: Option<i32>,
    available: i32,
) -> AppResult<StockChange> {
    let Some(requested) = requested else {
        return Ok(StockChange::Unchanged);
    };

    let quantity = rebalanced_quantity(reserved, requested, available);
    if quantity < 0 {
        return Err(AppError::InsufficientStock {
            facility_id,
            requested: requested - reserved,
            available,
        });
    }

    if quantity == available {
        Ok(StockChange::Unchanged)
    } else {
        Ok(StockChange::SetTo {
            expected: available,
            quantity,
        })
    }
}

/// Current free units of a facility, locking the row for the rest of the
/// transaction where the backend supports it.
pub async fn read_quantity<C>(conn: &C, facility_id: Uuid) -> AppResult<i32>
where
    C: ConnectionTrait,
{
    facility::Entity::find_by_id(facility_id)
        .select_only()
        .column(facility::Column::Quantity)
        .lock_exclusive()
        .into_tuple::<i32>()
        .one(conn)
        .await?
        .ok_or_else(|| facility_not_found(facility_id))
}

/// Write an absolute stock value, but only if the counter still reads
/// `expected`.
pub async fn apply_delta<C>(
    conn: &C,
    facility_id: Uuid,
    expected: i32,
    new_quantity: i32,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    if new_quantity < 0 {
        return Err(AppError::InsufficientStock {
            facility_id,
            requested: expected - new_quantity,
            available: expected,
        });
    }

    let result = facility::Entity::update_many()
        .col_expr(facility::Column::Quantity, Expr::value(new_quantity))
        .col_expr(facility::Column::UpdatedAt, Expr::value(now()))
        .filter(facility::Column::Id.eq(facility_id))
        .filter(facility::Column::Quantity.eq(expected))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale_write(conn, facility_id).await?);
    }

    tracing::debug!(%facility_id, from = expected, to = new_quantity, "Stock updated");
    Ok(())
}

/// Take `units` out of stock in one conditional statement.
pub async fn reserve<C>(conn: &C, facility_id: Uuid, units: i32) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let result = facility::Entity::update_many()
        .col_expr(
            facility::Column::Quantity,
            Expr::col(facility::Column::Quantity).sub(units),
        )
        .col_expr(facility::Column::UpdatedAt, Expr::value(now()))
        .filter(facility::Column::Id.eq(facility_id))
        .filter(facility::Column::Quantity.gte(units))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let available = read_quantity(conn, facility_id).await?;
        return Err(AppError::InsufficientStock {
            facility_id,
            requested: units,
            available,
        });
    }

    tracing::debug!(%facility_id, units, "Stock reserved");
    Ok(())
}

/// Put `units` back into stock.
pub async fn release<C>(conn: &C, facility_id: Uuid, units: i32) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let result = facility::Entity::update_many()
        .col_expr(
            facility::Column::Quantity,
            Expr::col(facility::Column::Quantity).add(units),
        )
        .col_expr(facility::Column::UpdatedAt, Expr::value(now()))
        .filter(facility::Column::Id.eq(facility_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(facility_not_found(facility_id));
    }

    tracing::debug!(%facility_id, units, "Stock released");
    Ok(())
}

/// Set the free units of a facility outright after buying or writing off
/// stock. Reservations stay as they are, so the owned total moves by the
/// returned delta.
pub async fn restock<C>(conn: &C, facility_id: Uuid, quantity: i32) -> AppResult<i32>
where
    C: ConnectionTrait,
{
    if quantity < 0 {
        return Err(AppError::BadRequest(
            "Facility stock cannot be negative".to_string(),
        ));
    }

    let current = read_quantity(conn, facility_id).await?;
    if quantity != current {
        apply_delta(conn, facility_id, current, quantity).await?;
    }
    Ok(quantity - current)
}

async fn stale_write<C>(conn: &C, facility_id: Uuid) -> AppResult<AppError>
where
    C: ConnectionTrait,
{
    let exists = facility::Entity::find_by_id(facility_id)
        .one(conn)
        .await?
        .is_some();

    if exists {
        tracing::warn!(%facility_id, "Stock changed between read and write");
        Ok(AppError::StockConflict { facility_id })
    } else {
        Ok(facility_not_found(facility_id))
    }
}

fn facility_not_found(facility_id: Uuid) -> AppError {
    AppError::NotFound(format!("Facility {} not found", facility_id))
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}
