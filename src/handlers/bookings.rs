use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::EntityTrait;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::employee::{self, EmployeeRole};
use crate::error::{AppError, AppResult};
use crate::services::bookings::{
    self, BookingDetails, CreatedWindow, NewBooking, RequestedFacility,
};
use crate::utils::jwt::Claims;
use crate::utils::pagination::{PageQuery, PageRequest, Paged};
use crate::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_START_DATE: &str = "1000-01-01";
const DEFAULT_END_DATE: &str = "3000-12-31";

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Admins may book on behalf of someone else.
    pub employee_id: Option<Uuid>,
    pub room_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub facilities: Vec<RequestedFacility>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecideBookingRequest {
    pub status: BookingStatus,
}

/// Request a room, optionally with facilities (admin, employee)
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingDetails>> {
    if payload.end_time <= payload.start_time {
        return Err(AppError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }
    if payload.facilities.iter().any(|f| f.quantity <= 0) {
        return Err(AppError::BadRequest(
            "Facility quantities must be positive".to_string(),
        ));
    }

    let employee_id = match payload.employee_id {
        Some(id) if id != claims.sub => {
            if claims.role != EmployeeRole::Admin {
                return Err(AppError::Forbidden(
                    "Cannot book on behalf of another employee".to_string(),
                ));
            }
            employee::Entity::find_by_id(id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))?;
            id
        }
        _ => claims.sub,
    };

    let details = bookings::create_booking(
        &state.db,
        NewBooking {
            employee_id,
            room_id: payload.room_id,
            description: payload.description,
            start_time: payload.start_time,
            end_time: payload.end_time,
            facilities: payload.facilities,
        },
    )
    .await?;

    Ok(Json(details))
}

/// List bookings created within a date range (admin, ga)
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Paged<BookingDetails>>> {
    let window = created_window(query.start_date.as_deref(), query.end_date.as_deref())?;
    let page = PageRequest::new(query.page.unwrap_or(0), query.size.unwrap_or(0))?;

    let (data, paging) = bookings::list_bookings(&state.db, page, window).await?;
    Ok(Json(Paged::new(data, paging)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingDetails>> {
    Ok(Json(bookings::get_booking(&state.db, booking_id).await?))
}

/// Bookings of one employee. Employees only see their own.
pub async fn list_employee_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(employee_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paged<BookingDetails>>> {
    if claims.role != EmployeeRole::Admin && claims.sub != employee_id {
        return Err(AppError::Forbidden(
            "Cannot view another employee's bookings".to_string(),
        ));
    }

    let (data, paging) =
        bookings::list_bookings_by_employee(&state.db, employee_id, PageRequest::try_from(query)?)
            .await?;
    Ok(Json(Paged::new(data, paging)))
}

/// Accept or reject a booking (admin, ga)
pub async fn decide_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<DecideBookingRequest>,
) -> AppResult<Json<BookingDetails>> {
    tracing::debug!(%booking_id, approver = %claims.sub, status = ?payload.status, "Deciding booking");
    let details = bookings::decide_booking(&state.db, booking_id, payload.status).await?;
    Ok(Json(details))
}

fn parse_date(value: Option<&str>, default: &str) -> AppResult<NaiveDate> {
    let raw = value.filter(|v| !v.is_empty()).unwrap_or(default);
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("Invalid date {}, expected YYYY-MM-DD", raw)))
}

fn created_window(start: Option<&str>, end: Option<&str>) -> AppResult<CreatedWindow> {
    let start = parse_date(start, DEFAULT_START_DATE)?;
    let end = parse_date(end, DEFAULT_END_DATE)?;
    if end < start {
        return Err(AppError::BadRequest(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok(CreatedWindow::from_dates(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_cover_everything() {
        let window = created_window(None, Some("")).unwrap();
        assert_eq!(window.from.format(DATE_FORMAT).to_string(), "1000-01-01");
        assert_eq!(window.to.format("%Y-%m-%d %H:%M:%S").to_string(), "3000-12-31 23:59:59");
    }

    #[test]
    fn test_window_rejects_bad_input() {
        assert!(matches!(
            created_window(Some("01/02/2024"), None).unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            created_window(Some("2024-03-02"), Some("2024-03-01")).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_single_day_window() {
        let window = created_window(Some("2024-03-01"), Some("2024-03-01")).unwrap();
        assert_eq!(window.from.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(window.to.to_rfc3339(), "2024-03-01T23:59:59+00:00");
    }
}
