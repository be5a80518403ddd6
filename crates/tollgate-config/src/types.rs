//! Configuration types for Tollgate.
//!
//! These types carry no dependency on the mediator crate. Domain enums are
//! mirrored here and converted where the mediator is built. Every struct
//! implements [`Default`] so that a bare `[section]` header is a working
//! configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mediator task settings.
    pub mediator: MediatorSection,
    /// Pending-request registry behaviour.
    pub registry: RegistrySection,
    /// Initial wallet flags for standalone runs.
    pub wallet: WalletSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Mediator task settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorSection {
    /// Mailbox capacity. Senders wait once this many commands are queued.
    pub mailbox_capacity: usize,
}

impl Default for MediatorSection {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
        }
    }
}

/// How a second request from an already-pending origin is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRequests {
    /// One entry per origin; the newest request wins.
    #[default]
    Replace,
    /// Every request is kept until the origin is resolved.
    Queue,
}

/// Pending-request registry behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Duplicate request handling.
    pub duplicate_policy: DuplicateRequests,
}

/// Initial wallet flags.
///
/// In an embedded deployment these come from the preferences store and the
/// keyring. The standalone binary seeds its toggles from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSection {
    /// Whether privacy mode starts enabled.
    pub privacy_mode: bool,
    /// Whether the wallet starts unlocked.
    pub start_unlocked: bool,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            privacy_mode: true,
            start_unlocked: false,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["tollgate_approval=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
