use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::employee::{self, EmployeeRole};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::hash_password;
use crate::utils::pagination::{PageQuery, PageRequest, Paged, Paging};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: EmployeeRole,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub contact: String,
}

/// Create an employee account (admin)
pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> AppResult<Json<employee::Model>> {
    if payload.name.trim().is_empty() || payload.username.trim().is_empty() {
        return Err(AppError::BadRequest("Name and username are required".to_string()));
    }
    if payload.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let existing = employee::Entity::find()
        .filter(employee::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let created = employee::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        username: Set(payload.username),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role),
        division: Set(payload.division),
        position: Set(payload.position),
        contact: Set(payload.contact),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(employee_id = %created.id, role = ?created.role, "Employee created");
    Ok(Json(created))
}

/// List employees (admin)
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paged<employee::Model>>> {
    let page = PageRequest::try_from(query)?;
    let paginator = employee::Entity::find()
        .order_by_asc(employee::Column::Name)
        .paginate(&state.db, page.size);

    let total = paginator.num_items().await?;
    let employees = paginator.fetch_page(page.index()).await?;

    Ok(Json(Paged::new(employees, Paging::new(page, total))))
}

/// Get an employee by id (any role)
pub async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<employee::Model>> {
    let employee = employee::Entity::find_by_id(employee_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee_id)))?;
    Ok(Json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_employee, setup_db, test_state};

    #[tokio::test]
    async fn test_get_employee() {
        let db = setup_db().await;
        let frank = insert_employee(&db, "frank").await;
        let state = test_state(db);

        let Json(found) = get_employee(State(state.clone()), Path(frank.id))
            .await
            .unwrap();
        assert_eq!(found.username, "frank");
        assert!(serde_json::to_value(&found).unwrap().get("password_hash").is_none());

        let err = get_employee(State(state), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
