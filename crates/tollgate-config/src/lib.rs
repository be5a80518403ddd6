//! Tollgate Config - layered configuration for the approval mediator.
//!
//! Configuration is assembled from an embedded defaults file, optional
//! system and user files, an optional explicit file, and `TOLLGATE_*`
//! environment fallbacks. Every resolved field remembers which layer set it
//! so that `tollgate config show` can explain the result.
//!
//! # Example
//!
//! ```no_run
//! let resolved = tollgate_config::load(None, None)?;
//! println!("privacy mode: {}", resolved.config.wallet.privacy_mode);
//! # Ok::<(), tollgate_config::ConfigError>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod env;
mod error;
mod loader;
mod merge;
mod show;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use merge::{ConfigLayer, FieldSources};
pub use show::ResolvedConfig;
pub use types::{
    Config, DuplicateRequests, LoggingSection, MediatorSection, RegistrySection, WalletSection,
};
pub use validate::{MAX_MAILBOX_CAPACITY, validate};
