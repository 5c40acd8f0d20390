//! # Pix Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize logging and, when a collector is configured, OpenTelemetry
//! - Initialize the repository adapter and key codec
//! - Start the HTTP server

mod config;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pix_hex::{PixService, inbound::HttpServer};
use pix_repo::{HmacKeyCodec, build_repo};

const SERVICE_NAME: &str = "pix-service";

/// OpenTelemetry providers, kept alive until shutdown so spans and metrics get flushed.
struct Telemetry {
    tracer_provider: sdktrace::SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    fn init(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, Self)> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        // gRPC exporter with batch processing (non-blocking)
        let span_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        let tracer_provider = sdktrace::SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        // Feeds the HTTP metrics layer in pix-hex
        let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(metric_exporter)
            .build();
        global::set_meter_provider(meter_provider.clone());

        use opentelemetry::trace::TracerProvider as _;
        let tracer = tracer_provider.tracer(SERVICE_NAME);
        Ok((
            tracer,
            Self {
                tracer_provider,
                meter_provider,
            },
        ))
    }

    fn shutdown(self) {
        let _ = self.tracer_provider.shutdown();
        let _ = self.meter_provider.shutdown();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;

    let (otel_tracer, telemetry) = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let (tracer, telemetry) = Telemetry::init(endpoint)?;
            (Some(tracer), Some(telemetry))
        }
        None => (None, None),
    };
    let otel_layer = otel_tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pix_app=debug,pix_hex=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .with(otel_layer)
        .init();

    tracing::info!("Starting pix server on port {}", config.port);
    if telemetry.is_some() {
        tracing::info!("Exporting telemetry over OTLP");
    }

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    let codec = HmacKeyCodec::new(config.pix_key_secret.as_bytes());

    let service = PixService::new(repo, codec);
    let server = HttpServer::with_rate_limit(service, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    if let Some(telemetry) = telemetry {
        telemetry.shutdown();
    }
    Ok(())
}
