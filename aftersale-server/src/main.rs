//! Aftersale Server
//!
//! A headless after-sales service for commerce orders: complaints, OTP-gated
//! cancellations, refunds, and courier status ingestion.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use aftersale_core::courier::CourierClient;
use aftersale_core::events::{EventSenders, mail_event_channel};
use aftersale_core::gateway::GatewayClient;
use aftersale_core::processors::{Mailer, RefundReconciler};
use aftersale_core::workflow::resolution::RefundWorkflow;
use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Aftersale - Headless after-sales service for commerce orders
#[derive(Parser, Debug)]
#[command(name = "aftersale-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./aftersale-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting aftersale-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // The outbound clients take their config snapshot at startup.
    let gateway_client = GatewayClient::new(loaded_config.gateway.clone());
    let courier_client = CourierClient::new(loaded_config.courier.clone());
    let mail_config = loaded_config.mail.clone();

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Event channel feeding the mailer, and the shutdown signal shared
    // by every background processor.
    let (mail_tx, mail_rx) = mail_event_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let mailer = Mailer::new(mail_config, mail_rx, shutdown_rx.clone());
    let mailer_handle = tokio::spawn(mailer.run());

    let reconciler = RefundReconciler::new(
        db_pool.clone(),
        gateway_client.clone(),
        mail_tx.clone(),
        shutdown_rx,
    );
    let reconciler_handle = tokio::spawn(reconciler.run());

    // Create application state
    let state = AppState {
        db: db_pool.clone(),
        config: shared_config,
        event_senders: EventSenders {
            mail: mail_tx.clone(),
        },
        refunds: RefundWorkflow {
            pool: db_pool.clone(),
            gateway: gateway_client,
            courier: courier_client,
            mail_tx,
        },
    };

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the background processors and the config reload handler
    let _ = shutdown_tx.send(true);
    shutdown_notify.notify_one();
    let _ = mailer_handle.await;
    let _ = reconciler_handle.await;

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
