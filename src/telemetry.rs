use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub otlp_endpoint: Option<String>,
    pub enable_tracing: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            enable_tracing: std::env::var("OTEL_TRACES_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            export_timeout: Duration::from_secs(30),
        }
    }
}

impl TelemetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            environment: format!("{:?}", config.app.environment).to_lowercase(),
            ..Self::default()
        }
    }
}

/// Keeps the exporter alive until `shutdown`.
pub struct TelemetryHandles {
    otlp_enabled: bool,
}

impl TelemetryHandles {
    /// Flushes pending spans.
    pub async fn shutdown(self) -> Result<()> {
        if self.otlp_enabled {
            info!("Shutting down telemetry providers...");
            global::shutdown_tracer_provider();
        }
        Ok(())
    }
}

pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryHandles> {
    setup_tracing_subscriber()?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        "Initializing telemetry"
    );

    let otlp_enabled = config.enable_tracing && config.otlp_endpoint.is_some();
    if otlp_enabled {
        init_tracing(&config)?;
    } else {
        info!("No OTLP endpoint configured, using console-only tracing");
    }

    Ok(TelemetryHandles { otlp_enabled })
}

fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(());
    };
    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_resource(resource)
                .with_sampler(opentelemetry_sdk::trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;

    info!(%endpoint, "Distributed tracing initialized with OTLP exporter");
    Ok(())
}

fn setup_tracing_subscriber() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug,tower_http=info", env!("CARGO_CRATE_NAME")).into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
