use fleet_config::Environment;
use std::sync::Once;
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, registry};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to load the runtime environment: {0}")]
    Environment(#[from] std::io::Error),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),
}

/// Initializes tracing for a fleet binary.
///
/// Output format follows the runtime environment: structured JSON lines in
/// prod and staging (one event per line, for log aggregation), human-readable
/// output in dev. The filter honors `RUST_LOG` and defaults to `info`.
///
/// Invocations are short-lived, so events go straight to stderr; there is no
/// background writer to flush on shutdown.
pub fn init_tracing(service_name: &str) -> Result<(), TracingError> {
    let environment = Environment::load()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if environment.is_prod() {
        let subscriber = registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        set_global_default(subscriber)?;
    } else {
        let subscriber = registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr));
        set_global_default(subscriber)?;
    }

    tracing::info!(service = service_name, %environment, "tracing initialized");

    Ok(())
}

static INIT_TEST_TRACING: Once = Once::new();

/// Initializes tracing for test runs.
///
/// Call once at the beginning of tests. Output is disabled unless
/// `ENABLE_TRACING=1` is set:
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // Default is prod, which emits JSON; tests want readable output.
            Environment::Dev.set();
            let _ = init_tracing("test");
        }
    });
}
