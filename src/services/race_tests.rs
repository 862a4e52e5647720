//! Two requests racing for the same units on separate pooled connections.
//! At most one may win and the counter must never drop below zero.

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::db::testing::{
    insert_employee, insert_facility, insert_room, setup_pooled_db, stock_of,
};
use crate::entities::room_facility;
use crate::error::{AppError, AppResult};
use crate::services::assignments::{self, NewAssignment};
use crate::services::bookings::{self, NewBooking, RequestedFacility};

const ROUNDS: usize = 8;
const MINTED: i32 = 10;
const WANTED: i32 = 6;

/// Losing a race is a domain rejection or the database refusing the second
/// writer, never anything else.
fn assert_lost_race(err: &AppError) {
    match err {
        AppError::InsufficientStock { .. } | AppError::StockConflict { .. } => {}
        AppError::Database(e) => {
            let message = e.to_string().to_lowercase();
            assert!(
                message.contains("locked") || message.contains("busy"),
                "unexpected storage error: {e}"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

async fn settle<T>(db: &DatabaseConnection, facility_id: Uuid, outcomes: [AppResult<T>; 2]) {
    let mut wins = 0;
    for outcome in &outcomes {
        match outcome {
            Ok(_) => wins += 1,
            Err(err) => assert_lost_race(err),
        }
    }
    assert!(wins <= 1, "both requests took {WANTED} of {MINTED} units");

    let reserved: i32 = room_facility::Entity::find()
        .filter(room_facility::Column::FacilityId.eq(facility_id))
        .all(db)
        .await
        .unwrap()
        .iter()
        .map(|a| a.quantity)
        .sum();
    let stock = stock_of(db, facility_id).await;

    assert!(stock >= 0, "stock went negative: {stock}");
    assert_eq!(reserved, wins * WANTED);
    assert_eq!(stock, MINTED - reserved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_assignments_never_oversell() {
    let (_dir, db) = setup_pooled_db(4).await;
    let room = insert_room(&db, "R1", "available").await;

    for round in 0..ROUNDS {
        let projector = insert_facility(&db, &format!("Projector {round}"), MINTED).await;
        let request = || NewAssignment {
            room_id: room.id,
            facility_id: projector.id,
            quantity: WANTED,
            description: String::new(),
        };

        let (first, second) = tokio::join!(
            assignments::create_assignment(&db, request()),
            assignments::create_assignment(&db, request()),
        );
        settle(&db, projector.id, [first, second]).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_bookings_never_oversell() {
    let (_dir, db) = setup_pooled_db(4).await;
    let employee = insert_employee(&db, "erin").await;
    let room = insert_room(&db, "R1", "available").await;

    for round in 0..ROUNDS {
        let chairs = insert_facility(&db, &format!("Chair {round}"), MINTED).await;
        let request = || {
            let start = Utc::now() + Duration::days(1);
            NewBooking {
                employee_id: employee.id,
                room_id: room.id,
                description: "quarterly review".to_string(),
                start_time: start,
                end_time: start + Duration::hours(1),
                facilities: vec![RequestedFacility {
                    facility_id: chairs.id,
                    quantity: WANTED,
                    description: String::new(),
                }],
            }
        };

        let (first, second) = tokio::join!(
            bookings::create_booking(&db, request()),
            bookings::create_booking(&db, request()),
        );
        settle(&db, chairs.id, [first, second]).await;
    }
}
