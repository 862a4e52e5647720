pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_employees;
mod m20240301_000002_create_rooms;
mod m20240301_000003_create_facilities;
mod m20240301_000004_create_bookings;
mod m20240301_000005_create_room_facilities;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_employees::Migration),
            Box::new(m20240301_000002_create_rooms::Migration),
            Box::new(m20240301_000003_create_facilities::Migration),
            Box::new(m20240301_000004_create_bookings::Migration),
            Box::new(m20240301_000005_create_room_facilities::Migration),
        ]
    }
}
