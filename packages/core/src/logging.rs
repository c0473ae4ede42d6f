use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: this crate at info, dependencies quiet.
pub const DEFAULT_FILTER: &str = "warn,distributor_crm=info";

/// Initialize structured logging for the CLI.
///
/// This must be called once at startup (in main.rs). Logs go to stderr so
/// rendered tables and CSV on stdout stay clean.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Logging initialized");
}
