//! Account Service Library
//!
//! Account management over HTTP: registration, profile and status updates,
//! filtered listing, and a circuit-broken read of the courses an account is
//! enrolled in. Every account mutation is paired with an event published to
//! the event bus.

pub mod api;
pub mod clients;
pub mod config;
pub mod events;
pub mod infra;
pub mod query;
pub mod repository;
pub mod resilience;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::clients::{CourseClient, ResilientCourseClient};
use crate::config::AccountServiceConfig;
use crate::events::{EventEmitter, RedisEventEmitter};
use crate::infra::Database;
use crate::repository::{
    AccountRepository, AccountStore, SubscriptionRepository, SubscriptionStore,
};
use crate::resilience::{BreakerSettings, CircuitBreaker};
use crate::service::{
    AccountLocks, AccountManager, AccountService, AccountUnitOfWork, SubscriptionManager,
    SubscriptionService,
};

/// Run migrations against the configured database.
pub async fn run_migrations(
    config: &AccountServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action, exposed as `migrate <action>` on the command line.
#[derive(Debug, Clone, Copy, clap::Subcommand)]
pub enum MigrateAction {
    /// Apply pending migrations
    Up,
    /// Roll back the last applied migration
    Down,
    /// List migrations and whether each is applied
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

/// Wire the service graph around the repositories and event emitter.
///
/// The breaker is created here, once, and shared with the course client.
pub fn build_state(
    repo: Arc<dyn AccountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    emitter: Arc<dyn EventEmitter>,
    config: &AccountServiceConfig,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let unit_of_work = Arc::new(AccountUnitOfWork::new(
        Arc::clone(&repo),
        emitter,
        AccountLocks::new(),
    ));
    let subscriptions: Arc<dyn SubscriptionService> = Arc::new(SubscriptionManager::new(
        Arc::clone(&repo),
        subscriptions,
    ));
    let accounts: Arc<dyn AccountService> = Arc::new(AccountManager::new(repo, unit_of_work));

    let breaker = Arc::new(CircuitBreaker::new(
        "course-service",
        BreakerSettings::from(&config.course_breaker),
    ));
    let course_client = CourseClient::new(&config.course_service)?;
    let courses = Arc::new(ResilientCourseClient::new(course_client, breaker));

    Ok(AppState::new(accounts, subscriptions, courses))
}

/// Router with tracing and CORS layers applied.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Connect the database and event bus, then serve HTTP on the configured address.
pub async fn serve(config: AccountServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;
    let repo: Arc<dyn AccountRepository> = Arc::new(AccountStore::new(db.get_connection()));
    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(SubscriptionStore::new(db.get_connection()));

    // Connect to the event bus
    let emitter = RedisEventEmitter::connect(&config.event_bus).await?;
    info!(channel = %emitter.channel(), "Publishing account events");

    let state = build_state(repo, subscriptions, Arc::new(emitter), &config)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    info!(
        "{} listening on {}, course service at {}",
        config.service.service_name, addr, config.course_service.endpoint
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
