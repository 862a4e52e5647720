//! Fixtures for engine tests: a migrated in-memory SQLite database.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::Config;
use crate::entities::employee::{self, EmployeeRole};
use crate::entities::{facility, room};
use crate::AppState;

pub async fn setup_db() -> DatabaseConnection {
    // One connection: every pooled connection to `sqlite::memory:` is a separate database
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    migrated(opts).await
}

/// A file database with a real pool, so transactions can overlap. Keep the
/// returned directory alive for as long as the connection is used.
pub async fn setup_pooled_db(connections: u32) -> (TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("booking.db").display());

    let mut opts = ConnectOptions::new(url);
    opts.max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);
    (dir, migrated(opts).await)
}

async fn migrated(opts: ConnectOptions) -> DatabaseConnection {
    let db = Database::connect(opts)
        .await
        .expect("failed to open sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    db
}

/// State for calling handlers directly.
pub fn test_state(db: DatabaseConnection) -> AppState {
    AppState {
        db,
        config: Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            rate_limit_per_ms: 60,
            rate_limit_burst: 1000,
            max_concurrent_requests: 16,
        },
    }
}

pub async fn insert_employee(db: &DatabaseConnection, username: &str) -> employee::Model {
    let now = Utc::now().fixed_offset();
    employee::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(username.to_string()),
        username: Set(username.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(EmployeeRole::Employee),
        division: Set("Engineering".to_string()),
        position: Set("Staff".to_string()),
        contact: Set("0800".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert employee")
}

pub async fn insert_room(db: &DatabaseConnection, name: &str, status: &str) -> room::Model {
    let now = Utc::now().fixed_offset();
    room::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        room_type: Set("meeting".to_string()),
        capacity: Set(8),
        status: Set(status.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert room")
}

pub async fn insert_facility(db: &DatabaseConnection, name: &str, quantity: i32) -> facility::Model {
    let now = Utc::now().fixed_offset();
    facility::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert facility")
}

pub async fn stock_of(db: &DatabaseConnection, facility_id: Uuid) -> i32 {
    facility::Entity::find_by_id(facility_id)
        .one(db)
        .await
        .expect("query failed")
        .expect("facility missing")
        .quantity
}
