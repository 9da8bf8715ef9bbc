use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where dashboard logs and spans go.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Reported as `service.name` on exported spans.
    pub service_name: String,
    /// OTLP/HTTP base URL; the exporter appends `/v1/traces`.
    pub otlp_endpoint: Option<String>,
    /// Bearer token sent to the OTLP collector.
    pub otlp_token: Option<String>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_otlp(mut self, endpoint: impl Into<String>, token: Option<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self.otlp_token = token;
        self
    }
}

/// Install the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). When an OTLP endpoint is
/// configured, spans are also exported and the returned provider must be kept
/// alive and shut down before exit. Calling this more than once is harmless:
/// later calls leave the first subscriber in place.
pub fn init_tracing(config: &TelemetryConfig) -> Option<TracerProvider> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
        return None;
    };

    let mut headers = std::collections::HashMap::new();
    if let Some(token) = config.otlp_token.as_deref().filter(|t| !t.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()
    {
        Ok(e) => e,
        Err(err) => {
            eprintln!("failed to create OTLP exporter: {err}, logging to stdout only");
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init();
            return None;
        }
    };

    let service_name = config.service_name.clone();
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.clone()));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(endpoint, %service_name, "OTLP tracing enabled");
    }
    Some(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_without_otlp_is_repeatable() {
        let config = TelemetryConfig::new("clusterdash-test");
        assert!(init_tracing(&config).is_none());
        assert!(init_tracing(&config).is_none());
        tracing::info!("subscriber installed");
    }

    #[test]
    fn test_with_otlp() {
        let config = TelemetryConfig::new("clusterdash")
            .with_otlp("http://127.0.0.1:4318", Some("secret".to_string()));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://127.0.0.1:4318"));
        assert_eq!(config.otlp_token.as_deref(), Some("secret"));
    }
}
