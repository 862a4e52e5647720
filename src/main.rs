use std::net::SocketAddr;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use booking_room_backend::{
    config::Config,
    db,
    entities::employee::{self, EmployeeRole},
    handlers::auth::hash_password,
    middleware::rate_limit::{create_global_governor, log_request},
    routes, AppResult, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_room_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    seed_admin(&db, &config)
        .await
        .expect("Failed to seed admin account");

    let governor = create_global_governor(&config).expect("Failed to configure rate limiting");

    let state = AppState {
        db,
        config: config.clone(),
    };

    let app = routes::create_router(state)
        .layer(axum::middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(governor)
        .layer(ServiceBuilder::new().concurrency_limit(config.max_concurrent_requests));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Create the admin employee on first boot
async fn seed_admin(db: &DatabaseConnection, config: &Config) -> AppResult<()> {
    let existing = employee::Entity::find()
        .filter(employee::Column::Username.eq(&config.admin_username))
        .one(db)
        .await?;

    if existing.is_none() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let admin = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Administrator".to_string()),
            username: Set(config.admin_username.clone()),
            password_hash: Set(hash_password(&config.admin_password)?),
            role: Set(EmployeeRole::Admin),
            division: Set(String::new()),
            position: Set(String::new()),
            contact: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        admin.insert(db).await?;
        tracing::info!("Admin account created: {}", config.admin_username);
    }
    Ok(())
}
