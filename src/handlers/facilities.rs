use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::facility;
use crate::error::{AppError, AppResult};
use crate::services::facilities::{self as catalogue, FacilityEdit};
use crate::utils::pagination::{PageQuery, PageRequest, Paged, Paging};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFacilityRequest {
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFacilityRequest {
    pub name: Option<String>,
    pub quantity: Option<i32>,
}

/// Register a facility with its initial stock (admin)
pub async fn create_facility(
    State(state): State<AppState>,
    Json(payload): Json<CreateFacilityRequest>,
) -> AppResult<Json<facility::Model>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Facility name is required".to_string()));
    }
    if payload.quantity < 0 {
        return Err(AppError::BadRequest("Quantity cannot be negative".to_string()));
    }

    let existing = facility::Entity::find()
        .filter(facility::Column::Name.eq(&payload.name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Facility {} already exists",
            payload.name
        )));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let created = facility::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        quantity: Set(payload.quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(facility_id = %created.id, quantity = created.quantity, "Facility created");
    Ok(Json(created))
}

/// List facilities with their free units
pub async fn list_facilities(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paged<facility::Model>>> {
    let page = PageRequest::try_from(query)?;
    let paginator = facility::Entity::find()
        .order_by_asc(facility::Column::Name)
        .paginate(&state.db, page.size);

    let total = paginator.num_items().await?;
    let facilities = paginator.fetch_page(page.index()).await?;

    Ok(Json(Paged::new(facilities, Paging::new(page, total))))
}

pub async fn get_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<Uuid>,
) -> AppResult<Json<facility::Model>> {
    let facility = facility::Entity::find_by_id(facility_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", facility_id)))?;
    Ok(Json(facility))
}

/// Rename a facility or set its free stock (admin)
pub async fn update_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<Uuid>,
    Json(payload): Json<UpdateFacilityRequest>,
) -> AppResult<Json<facility::Model>> {
    let edit = FacilityEdit {
        name: payload.name.filter(|n| !n.trim().is_empty()),
        quantity: payload.quantity,
    };
    if edit.name.is_none() && edit.quantity.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let updated = catalogue::edit_facility(&state.db, facility_id, edit).await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{setup_db, test_state};

    fn projector(quantity: i32) -> CreateFacilityRequest {
        CreateFacilityRequest {
            name: "Projector".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let state = test_state(setup_db().await);

        let Json(created) = create_facility(State(state.clone()), Json(projector(4)))
            .await
            .unwrap();
        assert_eq!(created.quantity, 4);

        let err = create_facility(State(state), Json(projector(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_and_update_validation() {
        let state = test_state(setup_db().await);

        let err = create_facility(State(state.clone()), Json(projector(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let Json(created) = create_facility(State(state.clone()), Json(projector(4)))
            .await
            .unwrap();
        let err = update_facility(
            State(state.clone()),
            Path(created.id),
            Json(UpdateFacilityRequest {
                name: Some(" ".to_string()),
                quantity: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let Json(updated) = update_facility(
            State(state),
            Path(created.id),
            Json(UpdateFacilityRequest {
                name: None,
                quantity: Some(7),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.quantity, 7);
    }
}
