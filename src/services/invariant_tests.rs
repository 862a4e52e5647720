//! Random operation sequences must keep every facility at
//! `owned - sum(reserved)` and never below zero. Restocking changes what is
//! owned by the difference it writes.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use proptest::sample::Index;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::db::testing::{insert_employee, insert_facility, insert_room, setup_db, stock_of};
use crate::entities::booking::BookingStatus;
use crate::entities::room_facility;
use crate::error::AppError;
use crate::services::assignments::{self, AllocationPatch, NewAssignment};
use crate::services::bookings::{self, NewBooking, RequestedFacility};
use crate::services::facilities::{edit_facility, FacilityEdit};

const MINTED: [i32; 2] = [8, 5];

#[derive(Debug, Clone)]
enum Op {
    Assign { room: usize, facility: usize, quantity: i32 },
    Resize { pick: Index, quantity: Option<i32> },
    Move { pick: Index, facility: usize },
    Book { room: usize, wants: Vec<(usize, i32)> },
    Decide { pick: Index, accept: bool },
    Restock { facility: usize, quantity: i32 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..2usize, 1..6i32).prop_map(|(room, facility, quantity)| Op::Assign {
            room,
            facility,
            quantity
        }),
        (any::<Index>(), prop::option::of(1..9i32))
            .prop_map(|(pick, quantity)| Op::Resize { pick, quantity }),
        (any::<Index>(), 0..2usize).prop_map(|(pick, facility)| Op::Move { pick, facility }),
        (0..3usize, prop::collection::vec((0..2usize, 1..5i32), 0..3))
            .prop_map(|(room, wants)| Op::Book { room, wants }),
        (any::<Index>(), any::<bool>()).prop_map(|(pick, accept)| Op::Decide { pick, accept }),
        (0..2usize, -2..12i32)
            .prop_map(|(facility, quantity)| Op::Restock { facility, quantity }),
    ]
}

async fn assert_consistent(db: &DatabaseConnection, facilities: &[Uuid], minted: &[i32; 2]) {
    let allocations = room_facility::Entity::find().all(db).await.unwrap();
    for (facility_id, minted) in facilities.iter().zip(minted) {
        let reserved: i32 = allocations
            .iter()
            .filter(|a| a.facility_id == *facility_id)
            .map(|a| a.quantity)
            .sum();
        let stock = stock_of(db, *facility_id).await;
        assert!(stock >= 0, "stock went negative: {stock}");
        assert_eq!(stock, *minted - reserved);
    }
}

fn assert_domain_error(err: AppError) {
    assert!(
        !matches!(err, AppError::Database(_) | AppError::Internal(_)),
        "unexpected storage error: {err:?}"
    );
}

async fn run(ops: Vec<Op>) {
    let db = setup_db().await;
    let employee = insert_employee(&db, "carol").await;
    let rooms = [
        insert_room(&db, "R1", "available").await.id,
        insert_room(&db, "R2", "available").await.id,
        insert_room(&db, "R3", "maintenance").await.id,
    ];
    let facilities = [
        insert_facility(&db, "Projector", MINTED[0]).await.id,
        insert_facility(&db, "Chair", MINTED[1]).await.id,
    ];

    let mut minted = MINTED;
    let mut allocations: Vec<Uuid> = Vec::new();
    let mut bookings: Vec<Uuid> = Vec::new();

    for op in ops {
        let outcome = match op {
            Op::Assign {
                room,
                facility,
                quantity,
            } => assignments::create_assignment(
                &db,
                NewAssignment {
                    room_id: rooms[room],
                    facility_id: facilities[facility],
                    quantity,
                    description: String::new(),
                },
            )
            .await
            .map(|a| allocations.push(a.id)),
            Op::Resize { pick, quantity } if !allocations.is_empty() => {
                let id = allocations[pick.index(allocations.len())];
                assignments::update_assignment(
                    &db,
                    id,
                    AllocationPatch {
                        quantity,
                        ..Default::default()
                    },
                )
                .await
                .map(|_| ())
            }
            Op::Move { pick, facility } if !allocations.is_empty() => {
                let id = allocations[pick.index(allocations.len())];
                assignments::update_assignment(
                    &db,
                    id,
                    AllocationPatch {
                        facility_id: Some(facilities[facility]),
                        ..Default::default()
                    },
                )
                .await
                .map(|_| ())
            }
            Op::Book { room, wants } => {
                let start = Utc::now() + Duration::hours(1);
                bookings::create_booking(
                    &db,
                    NewBooking {
                        employee_id: employee.id,
                        room_id: rooms[room],
                        description: "standup".to_string(),
                        start_time: start,
                        end_time: start + Duration::minutes(30),
                        facilities: wants
                            .into_iter()
                            .map(|(facility, quantity)| RequestedFacility {
                                facility_id: facilities[facility],
                                quantity,
                                description: String::new(),
                            })
                            .collect(),
                    },
                )
                .await
                .map(|details| {
                    bookings.push(details.booking.id);
                    allocations.extend(details.facilities.iter().map(|a| a.id));
                })
            }
            Op::Decide { pick, accept } if !bookings.is_empty() => {
                let id = bookings[pick.index(bookings.len())];
                let status = if accept {
                    BookingStatus::Accepted
                } else {
                    BookingStatus::Rejected
                };
                bookings::decide_booking(&db, id, status).await.map(|_| ())
            }
            Op::Restock { facility, quantity } => {
                let facility_id = facilities[facility];
                let before = stock_of(&db, facility_id).await;
                edit_facility(
                    &db,
                    facility_id,
                    FacilityEdit {
                        quantity: Some(quantity),
                        ..Default::default()
                    },
                )
                .await
                .map(|edited| minted[facility] += edited.quantity - before)
            }
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            assert_domain_error(err);
        }
        assert_consistent(&db, &facilities, &minted).await;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stock_always_matches_reservations(ops in prop::collection::vec(op(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(run(ops));
    }
}
