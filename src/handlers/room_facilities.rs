use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::room_facility;
use crate::error::{AppError, AppResult};
use crate::services::assignments::{self, AllocationPatch, NewAssignment};
use crate::utils::pagination::{PageQuery, PageRequest, Paged};
use crate::AppState;

/// Partial update body. Empty strings, nil ids and a zero quantity count as
/// "not provided".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoomFacilityRequest {
    pub room_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub description: Option<String>,
}

impl UpdateRoomFacilityRequest {
    fn into_patch(self) -> AppResult<AllocationPatch> {
        if matches!(self.quantity, Some(q) if q < 0) {
            return Err(AppError::BadRequest("Quantity cannot be negative".to_string()));
        }
        Ok(AllocationPatch {
            room_id: self.room_id.filter(|id| !id.is_nil()),
            facility_id: self.facility_id.filter(|id| !id.is_nil()),
            quantity: self.quantity.filter(|q| *q != 0),
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Attach facility units to a room outside of a booking (admin)
pub async fn create_room_facility(
    State(state): State<AppState>,
    Json(payload): Json<NewAssignment>,
) -> AppResult<Json<room_facility::Model>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".to_string()));
    }
    let allocation = assignments::create_assignment(&state.db, payload).await?;
    Ok(Json(allocation))
}

pub async fn list_room_facilities(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paged<room_facility::Model>>> {
    let (rows, paging) =
        assignments::list_assignments(&state.db, PageRequest::try_from(query)?).await?;
    Ok(Json(Paged::new(rows, paging)))
}

pub async fn get_room_facility(
    State(state): State<AppState>,
    Path(allocation_id): Path<Uuid>,
) -> AppResult<Json<room_facility::Model>> {
    Ok(Json(assignments::get_assignment(&state.db, allocation_id).await?))
}

/// Re-size or move an allocation, rebalancing facility stock
pub async fn update_room_facility(
    State(state): State<AppState>,
    Path(allocation_id): Path<Uuid>,
    Json(payload): Json<UpdateRoomFacilityRequest>,
) -> AppResult<Json<room_facility::Model>> {
    let patch = payload.into_patch()?;
    let updated = assignments::update_assignment(&state.db, allocation_id, patch).await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_mean_not_provided() {
        let patch = UpdateRoomFacilityRequest {
            room_id: Some(Uuid::nil()),
            facility_id: None,
            quantity: Some(0),
            description: Some(String::new()),
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.room_id, None);
        assert_eq!(patch.facility_id, None);
        assert_eq!(patch.quantity, None);
        assert_eq!(patch.description, None);
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let err = UpdateRoomFacilityRequest {
            quantity: Some(-2),
            ..Default::default()
        }
        .into_patch()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_values_pass_through() {
        let facility_id = Uuid::new_v4();
        let patch = UpdateRoomFacilityRequest {
            facility_id: Some(facility_id),
            quantity: Some(5),
            description: Some("podium".to_string()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.facility_id, Some(facility_id));
        assert_eq!(patch.quantity, Some(5));
        assert_eq!(patch.description.as_deref(), Some("podium"));
    }
}
