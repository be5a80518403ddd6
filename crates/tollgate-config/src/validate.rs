//! Post-merge validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

pub(crate) const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
pub(crate) const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Upper bound on the mediator mailbox.
pub const MAX_MAILBOX_CAPACITY: usize = 65_536;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    let capacity = config.mediator.mailbox_capacity;
    if capacity == 0 || capacity > MAX_MAILBOX_CAPACITY {
        return Err(invalid(
            "mediator.mailbox_capacity",
            format!("must be between 1 and {MAX_MAILBOX_CAPACITY}, got {capacity}"),
        ));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}', expected one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}', expected one of {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    if let Some(empty) = config.logging.directives.iter().position(|d| d.trim().is_empty()) {
        return Err(invalid(
            "logging.directives",
            format!("directive at index {empty} is empty"),
        ));
    }

    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}
