//! Tracing subscriber setup.
//!
//! Filter directives come from `LIBPROBE_LOG` (same syntax as `RUST_LOG`).

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "LIBPROBE_LOG";

const DEFAULT_FILTER: &str = "libprobe=info,libprobe_core=info,libprobe_analysis=info";

static INIT: Once = Once::new();

/// Install the global fmt subscriber. Safe to call more than once; only the first call wins.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        // A host may already have installed its own subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
