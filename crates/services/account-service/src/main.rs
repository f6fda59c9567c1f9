//! `account-service` binary: serves the HTTP API or manages the schema.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use account_service_lib::config::AccountServiceConfig;
use account_service_lib::MigrateAction;

/// Used when `RUST_LOG` is unset; request spans from `TraceLayer` are debug-level.
const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Parser)]
#[command(name = "account-service", version, about = "Account management microservice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API; flags override ACCOUNT_SERVICE_HOST / ACCOUNT_SERVICE_PORT
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply, roll back or inspect database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = AccountServiceConfig::from_env();

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.service.host = host;
            }
            if let Some(port) = port {
                config.service.port = port;
            }
            account_service_lib::serve(config).await
        }
        Command::Migrate { action } => account_service_lib::run_migrations(&config, action).await,
    }
}
