//! Booking coordinator: admits room bookings and reserves their facilities as
//! one atomic unit, and moves bookings through pending -> accepted | rejected.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::run_in_transaction;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::room_facility;
use crate::error::{AppError, AppResult};
use crate::services::{ledger, room_gate};
use crate::utils::pagination::{PageRequest, Paging};

#[derive(Debug, Clone, Deserialize)]
pub struct RequestedFacility {
    pub facility_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub employee_id: Uuid,
    pub room_id: Uuid,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub facilities: Vec<RequestedFacility>,
}

/// A booking together with the facility units reserved for it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub facilities: Vec<room_facility::Model>,
}

/// Inclusive `created_at` window for listings.
#[derive(Debug, Clone, Copy)]
pub struct CreatedWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl CreatedWindow {
    /// From the start of `start` to the last second of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let from = start.and_time(NaiveTime::MIN).and_utc();
        let to = end.and_time(NaiveTime::MIN).and_utc() + Duration::days(1) - Duration::seconds(1);
        Self { from, to }
    }
}

/// Create a booking and reserve every requested facility.
///
/// Either the booking exists afterwards with all of its allocations and the
/// stock decremented, or nothing from this call is visible.
pub async fn create_booking(
    db: &DatabaseConnection,
    request: NewBooking,
) -> AppResult<BookingDetails> {
    let room_id = request.room_id;
    let employee_id = request.employee_id;

    let details = run_in_transaction(db, "create_booking", move |txn| {
        Box::pin(async move {
            room_gate::ensure_bookable(txn, request.room_id).await?;

            let now: DateTimeWithTimeZone = Utc::now().into();
            let booking = booking::ActiveModel {
                id: Set(Uuid::new_v4()),
                employee_id: Set(request.employee_id),
                room_id: Set(request.room_id),
                description: Set(request.description),
                start_time: Set(request.start_time.into()),
                end_time: Set(request.end_time.into()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            if request.facilities.is_empty() {
                return Ok(BookingDetails {
                    booking,
                    facilities: Vec::new(),
                });
            }

            let mut facilities = Vec::with_capacity(request.facilities.len());
            for wanted in request.facilities {
                let available = ledger::read_quantity(txn, wanted.facility_id).await?;
                if wanted.quantity > available {
                    tracing::warn!(
                        booking_id = %booking.id,
                        facility_id = %wanted.facility_id,
                        requested = wanted.quantity,
                        available,
                        "Not enough stock for booking"
                    );
                    return Err(AppError::InsufficientStock {
                        facility_id: wanted.facility_id,
                        requested: wanted.quantity,
                        available,
                    });
                }

                let allocation = room_facility::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    room_id: Set(booking.room_id),
                    facility_id: Set(wanted.facility_id),
                    booking_id: Set(Some(booking.id)),
                    quantity: Set(wanted.quantity),
                    description: Set(wanted.description),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;

                ledger::reserve(txn, wanted.facility_id, wanted.quantity).await?;
                facilities.push(allocation);
            }

            Ok(BookingDetails {
                booking,
                facilities,
            })
        })
    })
    .await?;

    tracing::info!(
        booking_id = %details.booking.id,
        %room_id,
        %employee_id,
        facilities = details.facilities.len(),
        "Booking created"
    );
    Ok(details)
}

/// Record the approver's decision. Stock is left as it is, also on rejection.
pub async fn decide_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
    status: BookingStatus,
) -> AppResult<BookingDetails> {
    if !status.is_terminal() {
        return Err(AppError::BadRequest(
            "A booking can only be accepted or rejected".to_string(),
        ));
    }

    let current = find_booking(db, booking_id).await?;
    if current.status.is_terminal() {
        // TODO: decide with product whether decided bookings should be locked
        tracing::warn!(
            %booking_id,
            from = ?current.status,
            to = ?status,
            "Booking was already decided, overwriting"
        );
    }

    let mut active: booking::ActiveModel = current.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(db).await?;

    tracing::info!(%booking_id, status = ?updated.status, "Booking decided");

    let facilities = allocations_of(db, updated.id).await?;
    Ok(BookingDetails {
        booking: updated,
        facilities,
    })
}

pub async fn get_booking(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<BookingDetails> {
    let booking = find_booking(db, booking_id).await?;
    let facilities = allocations_of(db, booking.id).await?;
    Ok(BookingDetails {
        booking,
        facilities,
    })
}

/// Newest first, filtered by creation time.
pub async fn list_bookings(
    db: &DatabaseConnection,
    page: PageRequest,
    window: CreatedWindow,
) -> AppResult<(Vec<BookingDetails>, Paging)> {
    let from: DateTimeWithTimeZone = window.from.into();
    let to: DateTimeWithTimeZone = window.to.into();

    let query = booking::Entity::find().filter(booking::Column::CreatedAt.between(from, to));
    paged(db, query, page).await
}

pub async fn list_bookings_by_employee(
    db: &DatabaseConnection,
    employee_id: Uuid,
    page: PageRequest,
) -> AppResult<(Vec<BookingDetails>, Paging)> {
    let query = booking::Entity::find().filter(booking::Column::EmployeeId.eq(employee_id));
    paged(db, query, page).await
}

async fn paged(
    db: &DatabaseConnection,
    query: Select<booking::Entity>,
    page: PageRequest,
) -> AppResult<(Vec<BookingDetails>, Paging)> {
    let paginator = query
        .order_by_desc(booking::Column::CreatedAt)
        .order_by_asc(booking::Column::Id)
        .paginate(db, page.size);

    let total = paginator.num_items().await?;
    let bookings = paginator.fetch_page(page.index()).await?;
    let details = with_allocations(db, bookings).await?;

    Ok((details, Paging::new(page, total)))
}

async fn find_booking(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
}

async fn allocations_of(
    db: &DatabaseConnection,
    booking_id: Uuid,
) -> AppResult<Vec<room_facility::Model>> {
    Ok(room_facility::Entity::find()
        .filter(room_facility::Column::BookingId.eq(booking_id))
        .order_by_asc(room_facility::Column::CreatedAt)
        .all(db)
        .await?)
}

async fn with_allocations(
    db: &DatabaseConnection,
    bookings: Vec<booking::Model>,
) -> AppResult<Vec<BookingDetails>> {
    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    let allocations = room_facility::Entity::find()
        .filter(room_facility::Column::BookingId.is_in(ids))
        .order_by_asc(room_facility::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(bookings
        .into_iter()
        .map(|booking| {
            let facilities = allocations
                .iter()
                .filter(|a| a.booking_id == Some(booking.id))
                .cloned()
                .collect();
            BookingDetails {
                booking,
                facilities,
            }
        })
        .collect())
}
