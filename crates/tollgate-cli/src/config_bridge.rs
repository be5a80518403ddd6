//! Bridge from `tollgate_config::Config` to domain types.

use anyhow::Result;
use tollgate_approval::DuplicatePolicy;
use tollgate_config::{Config, DuplicateRequests};
use tollgate_telemetry::LogConfig;

/// Logging setup for the `[logging]` section.
///
/// Colors are only kept when stderr is a terminal.
pub(crate) fn to_log_config(config: &Config, stderr_is_terminal: bool) -> Result<LogConfig> {
    let log = LogConfig::from_section(&config.logging)?;
    Ok(if stderr_is_terminal {
        log
    } else {
        log.without_ansi()
    })
}

/// Registry policy for the `[registry]` section.
pub(crate) fn to_duplicate_policy(config: &Config) -> DuplicatePolicy {
    match config.registry.duplicate_policy {
        DuplicateRequests::Replace => DuplicatePolicy::Replace,
        DuplicateRequests::Queue => DuplicatePolicy::Queue,
    }
}
