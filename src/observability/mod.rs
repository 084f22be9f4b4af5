use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize structured logging for the service.
///
/// Honors `RUST_LOG` when set; otherwise defaults to info-level output for
/// the service, the HTTP trace layer, and the DynamoDB SDK.
pub fn init_tracing(service_name: &str, enable_json_logging: bool) -> Result<(), ObservabilityError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}=info,tower_http=info,aws_sdk_dynamodb=warn",
            service_name.replace('-', "_")
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if enable_json_logging {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_target(false),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| ObservabilityError::TracingInit(e.to_string()))
}
