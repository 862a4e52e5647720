use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, bookings, employees, facilities, room_facilities, rooms};
use crate::middleware::auth::{auth_middleware, require_admin, require_approver, require_booker};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes
    let auth_routes = Router::new().route("/login", post(auth::login));

    // Any authenticated employee
    let read_routes = Router::new()
        .route("/employees/{id}", get(employees::get_employee))
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{id}", get(rooms::get_room))
        .route("/facilities", get(facilities::list_facilities))
        .route("/facilities/{id}", get(facilities::get_facility))
        .route("/transactions/{id}", get(bookings::get_booking))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin only
    let admin_routes = Router::new()
        .route(
            "/employees",
            post(employees::create_employee).get(employees::list_employees),
        )
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/{id}", put(rooms::update_room))
        .route("/facilities", post(facilities::create_facility))
        .route("/facilities/{id}", put(facilities::update_facility))
        .route(
            "/roomfacilities",
            post(room_facilities::create_room_facility).get(room_facilities::list_room_facilities),
        )
        .route(
            "/roomfacilities/{id}",
            get(room_facilities::get_room_facility).put(room_facilities::update_room_facility),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Booking requests: admin, employee
    let booker_routes = Router::new()
        .route("/transactions", post(bookings::create_booking))
        .route(
            "/transactions/employee/{employee_id}",
            get(bookings::list_employee_bookings),
        )
        .layer(middleware::from_fn(require_booker))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Approvals and room status: admin, ga
    let approver_routes = Router::new()
        .route("/transactions", get(bookings::list_bookings))
        .route("/transactions/{id}/status", put(bookings::decide_booking))
        .route("/rooms/{id}/status", put(rooms::update_room_status))
        .layer(middleware::from_fn(require_approver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .merge(read_routes)
        .merge(admin_routes)
        .merge(booker_routes)
        .merge(approver_routes);

    Router::new().nest("/api/v1", api).with_state(state)
}
