//! Tracing/logging initialization.
//!
//! Structured JSON logs so sweep summaries and settlement failures can be
//! grepped per invoice id; filtering stays under `RUST_LOG` control.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset: settlement step tracing on,
/// everything else at info.
const DEFAULT_FILTER: &str = "info,defter_settlement=debug";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init();
        init();
    }
}
