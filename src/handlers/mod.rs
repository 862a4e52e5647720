pub mod auth;
pub mod bookings;
pub mod employees;
pub mod facilities;
pub mod room_facilities;
pub mod rooms;
