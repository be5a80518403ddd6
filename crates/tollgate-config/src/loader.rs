//! Config file discovery and layered loading.
//!
//! Layers, lowest precedence first:
//! 1. Embedded `defaults.toml`
//! 2. `/etc/tollgate/config.toml` (system)
//! 3. `~/.tollgate/config.toml` (user)
//! 4. A file named with `--config` (explicit)
//! 5. `TOLLGATE_*` environment fallbacks for fields no file set
//!
//! The merged tree is then deserialized and validated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

const SYSTEM_CONFIG_PATH: &str = "/etc/tollgate/config.toml";

/// Load the configuration with layered file precedence.
///
/// `home_override` replaces the `~/.tollgate` directory used for the user
/// layer. An `explicit` path must exist; the system and user files are
/// optional.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any file is unreadable or malformed, or if
/// the merged configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let user_dir = match home_override {
        Some(dir) => dir.to_path_buf(),
        None => home_directory()?.join(".tollgate"),
    };
    load_layers(&Layers {
        system: Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
        user: Some(user_dir.join("config.toml")),
        explicit: explicit.map(Path::to_path_buf),
        env_vars: collect_env_vars(),
    })
}

struct Layers {
    system: Option<PathBuf>,
    user: Option<PathBuf>,
    explicit: Option<PathBuf>,
    env_vars: HashMap<String, String>,
}

fn load_layers(layers: &Layers) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let optional = [
        (layers.system.as_deref(), ConfigLayer::System),
        (layers.user.as_deref(), ConfigLayer::User),
    ];
    for (path, layer) in optional {
        let Some(path) = path else { continue };
        if let Some(overlay) = try_load_file(path)? {
            deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), layer = %layer, "loaded config layer");
        }
    }

    if let Some(path) = layers.explicit.as_deref() {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        let layer = ConfigLayer::Explicit(path.display().to_string());
        deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded explicit config");
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, &layers.env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Read and parse a file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DuplicateRequests;
    use std::fs;

    fn layers(dir: &Path) -> Layers {
        Layers {
            system: Some(dir.join("system.toml")),
            user: Some(dir.join("user.toml")),
            explicit: None,
            env_vars: HashMap::new(),
        }
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_optional_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_layers(&layers(dir.path())).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("wallet.privacy_mode"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_user_overrides_system() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("system.toml"),
            "[wallet]\nprivacy_mode = false\n[mediator]\nmailbox_capacity = 32\n",
        )
        .unwrap();
        fs::write(dir.path().join("user.toml"), "[wallet]\nprivacy_mode = true\n").unwrap();

        let resolved = load_layers(&layers(dir.path())).unwrap();
        assert!(resolved.config.wallet.privacy_mode);
        assert_eq!(resolved.config.mediator.mailbox_capacity, 32);
        assert_eq!(
            resolved.field_sources.get("wallet.privacy_mode"),
            Some(&ConfigLayer::User)
        );
        assert_eq!(resolved.loaded_files.len(), 2);
    }

    #[test]
    fn test_explicit_file_wins_over_user() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("user.toml"),
            "[registry]\nduplicate_policy = \"replace\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("run.toml");
        fs::write(&explicit, "[registry]\nduplicate_policy = \"queue\"\n").unwrap();

        let mut l = layers(dir.path());
        l.explicit = Some(explicit);
        let resolved = load_layers(&l).unwrap();
        assert_eq!(
            resolved.config.registry.duplicate_policy,
            DuplicateRequests::Queue
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = layers(dir.path());
        l.explicit = Some(dir.path().join("nope.toml"));
        assert!(matches!(
            load_layers(&l),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_env_fallback_only_below_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user.toml"), "[logging]\nlevel = \"warn\"\n").unwrap();

        let mut l = layers(dir.path());
        l.env_vars.insert("TOLLGATE_LOG_LEVEL".to_owned(), "trace".to_owned());
        l.env_vars.insert("TOLLGATE_PRIVACY_MODE".to_owned(), "false".to_owned());
        let resolved = load_layers(&l).unwrap();

        assert_eq!(resolved.config.logging.level, "warn");
        assert!(!resolved.config.wallet.privacy_mode);
    }

    #[test]
    fn test_stray_env_values_do_not_stop_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = layers(dir.path());
        l.env_vars.insert("TOLLGATE_MAILBOX_CAPACITY".to_owned(), "-5".to_owned());
        l.env_vars.insert("TOLLGATE_DUPLICATE_POLICY".to_owned(), "bogus".to_owned());
        l.env_vars.insert("TOLLGATE_LOG_FORMAT".to_owned(), "xml".to_owned());

        let resolved = load_layers(&l).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert_eq!(
            resolved.field_sources.get("mediator.mailbox_capacity"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_env_policy_reaches_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = layers(dir.path());
        l.env_vars.insert("TOLLGATE_DUPLICATE_POLICY".to_owned(), "queue".to_owned());
        l.env_vars.insert("TOLLGATE_MAILBOX_CAPACITY".to_owned(), "32".to_owned());

        let resolved = load_layers(&l).unwrap();
        assert_eq!(resolved.config.registry.duplicate_policy, DuplicateRequests::Queue);
        assert_eq!(resolved.config.mediator.mailbox_capacity, 32);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user.toml"), "[wallet\nprivacy_mode = ").unwrap();
        let err = load_layers(&layers(dir.path())).unwrap_err();
        assert!(err.to_string().contains("user.toml"));
    }

    #[test]
    fn test_invalid_merged_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("system.toml"), "[mediator]\nmailbox_capacity = 0\n").unwrap();
        assert!(matches!(
            load_layers(&layers(dir.path())),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user.toml"), "[wallet]\nprivacy_mode = \"yes\"\n").unwrap();
        assert!(matches!(
            load_layers(&layers(dir.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_home_override_reads_config_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[wallet]\nstart_unlocked = true\n").unwrap();
        let resolved = load(None, Some(dir.path())).unwrap();
        assert!(resolved.config.wallet.start_unlocked);
    }
}
