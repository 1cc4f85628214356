use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";

static PROVIDER: OnceCell<Option<SdkTracerProvider>> = OnceCell::new();

/// Configuration for tracing initialization.
#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    /// Directive string; falls back to `RUST_LOG`, then [`DEFAULT_FILTER`].
    pub env_filter: Option<String>,
    /// Falls back to `OTLP_ENDPOINT`. No exporter when neither is set.
    pub otlp_endpoint: Option<String>,
    /// Which module emitted the event. Off for interactive commands.
    pub with_target: bool,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "crm-server",
            env_filter: None,
            otlp_endpoint: None,
            with_target: false,
        }
    }
}

impl ObsConfig {
    pub fn service(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Self::default()
        }
    }

    fn filter(&self) -> Result<EnvFilter> {
        let directives = self
            .env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid log filter {directives:?}"))
    }

    fn endpoint(&self) -> Option<String> {
        self.otlp_endpoint
            .clone()
            .or_else(|| std::env::var("OTLP_ENDPOINT").ok())
            .filter(|endpoint| !endpoint.trim().is_empty())
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    PROVIDER
        .get_or_try_init(|| install(&config))
        .map(|_| ())
}

fn install(config: &ObsConfig) -> Result<Option<SdkTracerProvider>> {
    let registry = tracing_subscriber::registry()
        .with(config.filter()?)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target));

    let Some(endpoint) = config.endpoint() else {
        registry.try_init()?;
        return Ok(None);
    };

    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()?;
    let provider = SdkTracerProvider::builder()
        .with_resource(
            Resource::builder()
                .with_service_name(config.service_name)
                .build(),
        )
        .with_batch_exporter(exporter)
        .build();
    let tracer = provider.tracer(config.service_name);
    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;
    Ok(Some(provider))
}

/// Flush buffered spans before the process exits.
pub fn shutdown_tracing() {
    if let Some(Some(provider)) = PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            tracing::warn!(%err, "failed to flush spans");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let config = ObsConfig {
            env_filter: Some("debug".into()),
            ..ObsConfig::default()
        };
        assert_eq!(config.filter().unwrap().to_string(), "debug");
    }

    #[test]
    fn malformed_filter_is_reported() {
        let config = ObsConfig {
            env_filter: Some("crm=loud".into()),
            ..ObsConfig::default()
        };
        assert!(config.filter().is_err());
    }

    #[test]
    fn blank_endpoint_disables_export() {
        let config = ObsConfig {
            otlp_endpoint: Some("  ".into()),
            ..ObsConfig::default()
        };
        assert!(config.endpoint().is_none());
    }
}
