//! Tracing setup: console logging, plus optional OpenTelemetry export.
//!
//! Console output is always on and filtered by `RUST_LOG` (default `info`). OTLP export is off
//! unless `enable_otel_export` is set in the configuration; the exporter itself is configured
//! through the standard OpenTelemetry environment variables:
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` - collector URL (default `http://localhost:4318`)
//! - `OTEL_EXPORTER_OTLP_PROTOCOL` - `http/protobuf` (default) or `http/json`
//! - `OTEL_EXPORTER_OTLP_HEADERS` - comma-separated `key=value` pairs, `%20` decoded to a space
//! - `OTEL_SERVICE_NAME` - service name resource attribute (default `diner`)

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so spans can be flushed on shutdown; the tracing layer only holds a tracer.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// OTLP exporter settings read from the standard `OTEL_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OtlpSettings {
    service_name: String,
    endpoint: String,
    headers: HashMap<String, String>,
    json: bool,
}

impl OtlpSettings {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| "diner".to_string()),
            endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|| "http://localhost:4318".to_string()),
            headers: lookup("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|raw| parse_headers(&raw))
                .unwrap_or_default(),
            json: lookup("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() == Some("http/json"),
        }
    }
}

/// Install the global tracing subscriber.
pub fn init_telemetry(enable_otel_export: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if !enable_otel_export {
        registry.try_init()?;
        info!("Telemetry initialized (OTLP export disabled)");
        return Ok(());
    }

    let settings = OtlpSettings::from_env();
    match create_otlp_tracer(&settings) {
        Ok(tracer) => {
            registry.with(tracing_opentelemetry::layer().with_tracer(tracer)).try_init()?;
            info!(
                service_name = %settings.service_name,
                endpoint = %settings.endpoint,
                headers = settings.headers.len(),
                "Telemetry initialized with OTLP export enabled"
            );
        }
        Err(e) => {
            registry.try_init()?;
            warn!(endpoint = %settings.endpoint, "Telemetry initialized without OTLP export: {}", e);
        }
    }

    Ok(())
}

fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.replace("%20", " ")
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn create_otlp_tracer(settings: &OtlpSettings) -> anyhow::Result<opentelemetry_sdk::trace::Tracer> {
    let protocol = if settings.json { Protocol::HttpJson } else { Protocol::HttpBinary };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(&settings.endpoint)
        .with_protocol(protocol)
        .with_headers(settings.headers.clone())
        .build()?;

    let resource = opentelemetry_sdk::Resource::builder()
        .with_attribute(KeyValue::new("service.name", settings.service_name.clone()))
        .build();
    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let tracer = tracer_provider.tracer(settings.service_name.clone());
    let _ = TRACER_PROVIDER.set(tracer_provider);

    Ok(tracer)
}

/// Flush and shut down the OTLP exporter, if one was installed.
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        tracing::error!("Failed to shutdown tracer provider: {}", e);
    }
}
