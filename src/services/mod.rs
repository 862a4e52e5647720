pub mod assignments;
pub mod bookings;
pub mod facilities;
pub mod ledger;
pub mod room_gate;

#[cfg(test)]
mod invariant_tests;
#[cfg(test)]
mod race_tests;
