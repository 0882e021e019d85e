//! tracing subscriber setup.
//!
//! Log targets used across the crate: `ui_manager`, `layout`, `transport`,
//! `modules`, `snapshot`, `config`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Install a fmt subscriber using the configured filter, falling back to `RUST_LOG`.
pub fn init_from_config(config: &LoggingConfig) {
    let filter = match config.filter.as_deref() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        init_from_config(&LoggingConfig {
            filter: Some("spark_host=trace".to_string()),
        });
        tracing::debug!(target: "config", "logging installed");
    }
}
