//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `TYPECHECK_LOG=sentinel_typecheck=debug`.
pub const LOG_ENV: &str = "TYPECHECK_LOG";

/// Installs the global subscriber. Logs go to stderr so stdout only carries
/// the report. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
