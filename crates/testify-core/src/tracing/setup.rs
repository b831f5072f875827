//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

static INIT: Once = Once::new();

/// Initialize the Testify tracing/logging system.
///
/// Reads the `TESTIFY_LOG` environment variable for per-subsystem levels.
/// Format: `TESTIFY_LOG=testify_analysis::analysis=debug,testify_analysis::reify=trace`
///
/// Falls back to `testify=info` if `TESTIFY_LOG` is not set or is invalid.
/// Safe to call more than once; only the first call installs a subscriber,
/// and an already-installed global subscriber is left alone.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
