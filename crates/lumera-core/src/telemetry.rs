//! Tracing setup shared by binaries and integration harnesses.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise defaults to debug output for the
/// lumera crates. Set `LOG_FORMAT=json` for machine-readable output.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "lumera_core=debug,lumera_storage=debug,lumera_db=debug,lumera_processing=debug,\
         lumera_worker=debug,lumera_services=debug,sqlx=warn"
            .into()
    });

    let json_output = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::debug!(json = json_output, "Tracing initialized");
    Ok(())
}
