//! Facility catalogue edits. A new stock figure goes through the ledger so the
//! reservations already held against the facility keep their units.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::db::run_in_transaction;
use crate::entities::facility;
use crate::error::{AppError, AppResult};
use crate::services::ledger;

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct FacilityEdit {
    pub name: Option<String>,
    /// New number of free units.
    pub quantity: Option<i32>,
}

pub async fn edit_facility(
    db: &DatabaseConnection,
    facility_id: Uuid,
    edit: FacilityEdit,
) -> AppResult<facility::Model> {
    let (updated, delta) = run_in_transaction(db, "edit_facility", move |txn| {
        Box::pin(async move {
            // Locks the row for the rest of the edit
            ledger::read_quantity(txn, facility_id).await?;

            if let Some(name) = edit.name {
                let taken = facility::Entity::find()
                    .filter(facility::Column::Name.eq(&name))
                    .filter(facility::Column::Id.ne(facility_id))
                    .one(txn)
                    .await?;
                if taken.is_some() {
                    return Err(AppError::Conflict(format!("Facility {} already exists", name)));
                }

                facility::Entity::update_many()
                    .col_expr(facility::Column::Name, Expr::value(name))
                    .col_expr(
                        facility::Column::UpdatedAt,
                        Expr::value(Utc::now().fixed_offset()),
                    )
                    .filter(facility::Column::Id.eq(facility_id))
                    .exec(txn)
                    .await?;
            }

            let delta = match edit.quantity {
                Some(quantity) => ledger::restock(txn, facility_id, quantity).await?,
                None => 0,
            };

            let updated = facility::Entity::find_by_id(facility_id)
                .one(txn)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", facility_id)))?;
            Ok((updated, delta))
        })
    })
    .await?;

    tracing::info!(
        %facility_id,
        delta,
        quantity = updated.quantity,
        "Facility edited"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_facility, insert_room, setup_db, stock_of};
    use crate::entities::room_facility;
    use crate::services::assignments::{self, NewAssignment};

    async fn reserved_units(db: &DatabaseConnection, facility_id: Uuid) -> i32 {
        room_facility::Entity::find()
            .filter(room_facility::Column::FacilityId.eq(facility_id))
            .all(db)
            .await
            .unwrap()
            .iter()
            .map(|a| a.quantity)
            .sum()
    }

    fn quantity(quantity: i32) -> FacilityEdit {
        FacilityEdit {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_restock_keeps_reservations() {
        let db = setup_db().await;
        let r1 = insert_room(&db, "R1", "available").await;
        let projector = insert_facility(&db, "Projector", 10).await;
        assignments::create_assignment(
            &db,
            NewAssignment {
                room_id: r1.id,
                facility_id: projector.id,
                quantity: 4,
                description: String::new(),
            },
        )
        .await
        .unwrap();
        assert_eq!(stock_of(&db, projector.id).await, 6);

        // Three more projectors bought: 13 owned, 4 of them out
        let edited = edit_facility(&db, projector.id, quantity(9)).await.unwrap();
        assert_eq!(edited.quantity, 9);
        assert_eq!(edited.name, "Projector");
        assert_eq!(reserved_units(&db, projector.id).await, 4);
        assert_eq!(stock_of(&db, projector.id).await, 13 - 4);
    }

    #[tokio::test]
    async fn test_negative_stock_is_rejected() {
        let db = setup_db().await;
        let projector = insert_facility(&db, "Projector", 10).await;

        let err = edit_facility(
            &db,
            projector.id,
            FacilityEdit {
                name: Some("Beamer".to_string()),
                quantity: Some(-1),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        let unchanged = facility::Entity::find_by_id(projector.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.name, "Projector");
        assert_eq!(unchanged.quantity, 10);
    }

    #[tokio::test]
    async fn test_rename() {
        let db = setup_db().await;
        let projector = insert_facility(&db, "Projector", 10).await;
        insert_facility(&db, "Screen", 2).await;

        let err = edit_facility(
            &db,
            projector.id,
            FacilityEdit {
                name: Some("Screen".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let renamed = edit_facility(
            &db,
            projector.id,
            FacilityEdit {
                name: Some("Beamer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Beamer");
        assert_eq!(renamed.quantity, 10);
    }

    #[tokio::test]
    async fn test_edit_unknown_facility() {
        let db = setup_db().await;
        let err = edit_facility(&db, Uuid::new_v4(), quantity(3)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
