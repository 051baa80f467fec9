use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use coach_booking::{
    booking::{InMemoryCoachDirectory, LogNotifier, SystemClock},
    config,
    create_router, db,
    db::CoachProfile,
    i18n::init_i18n,
    telemetry::{init_telemetry, TelemetryConfig},
    AppState, Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = config::init().context("Failed to load configuration")?;
    let telemetry = init_telemetry(TelemetryConfig::from_config(config))
        .context("Failed to initialize telemetry")?;

    let storage = match &config.database {
        Some(database) => {
            let pool = db::init_pool(database)
                .await
                .context("Failed to connect to the database")?;
            info!("Using Postgres storage");
            Storage::postgres(pool)
        }
        None => {
            let coaches = Arc::new(InMemoryCoachDirectory::new());
            for id in &config.seed_coach_ids {
                coaches
                    .insert(CoachProfile {
                        id: *id,
                        display_name: format!("Coach {}", id),
                        hourly_rate: 0.0,
                        is_active: true,
                    })
                    .await;
            }
            info!(
                seeded_coaches = config.seed_coach_ids.len(),
                "DATABASE_URL not set, using in-memory storage"
            );
            Storage::in_memory(coaches)
        }
    };

    let localizer = Arc::new(init_i18n().context("Failed to load translations")?);
    let state = AppState::new(
        config.clone(),
        storage,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        localizer,
    );
    let app = create_router(state);

    let addr = config.server_addr();
    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
