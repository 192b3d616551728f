use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use appointment_cell::AppointmentState;
use doctor_cell::services::{InMemoryUserDirectory, SupabaseUserDirectory, UserDirectory};
use shared_config::{AppConfig, StoreBackend};
use shared_utils::clock::SystemClock;

async fn build_backends(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn AppointmentStore>, Arc<dyn UserDirectory>)> {
    match config.store_backend {
        StoreBackend::Supabase => {
            info!("Using Supabase store at {}", config.supabase_url);
            let store: Arc<dyn AppointmentStore> = Arc::new(SupabaseAppointmentStore::new(config));
            let directory: Arc<dyn UserDirectory> = Arc::new(SupabaseUserDirectory::new(config));
            Ok((store, directory))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; appointments are lost on restart");
            let directory = InMemoryUserDirectory::new();

            if let Some(path) = &config.user_seed_file {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading user seed file {}", path))?;
                let seeded = directory
                    .seed_from_json(&raw)
                    .await
                    .with_context(|| format!("loading user seed file {}", path))?;
                info!("Seeded {} users from {}", seeded, path);
            }

            let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());
            let directory: Arc<dyn UserDirectory> = Arc::new(directory);
            Ok((store, directory))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DentalCare API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());
    let (store, directory) = build_backends(&config).await?;
    let port = config.server_port;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create shared state
    let state = AppointmentState::new(config, store, directory, Arc::new(SystemClock));

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
