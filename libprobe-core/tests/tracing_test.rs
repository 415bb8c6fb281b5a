//! Tracing setup tests.

use libprobe_core::tracing::{init_tracing, LOG_ENV_VAR};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!(target: "libprobe_core", "subscriber installed");
}

#[test]
fn test_log_env_var_name() {
    assert_eq!(LOG_ENV_VAR, "LIBPROBE_LOG");
}
