pub mod booking;
pub mod employee;
pub mod facility;
pub mod room;
pub mod room_facility;
