//! Environment variable fallbacks.
//!
//! Environment variables fill fields that no file layer set. They never
//! override a value written in a config file.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources};
use crate::validate::{LOG_FORMATS, LOG_LEVELS, MAX_MAILBOX_CAPACITY};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Bool,
    /// Integer in `1..=max`.
    Count { max: u64 },
    /// One of a fixed set of names, matched case-insensitively.
    OneOf(&'static [&'static str]),
}

const DUPLICATE_POLICIES: &[&str] = &["replace", "queue"];

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TOLLGATE_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::OneOf(LOG_LEVELS),
    },
    EnvMapping {
        var_name: "TOLLGATE_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::OneOf(LOG_FORMATS),
    },
    EnvMapping {
        var_name: "TOLLGATE_PRIVACY_MODE",
        field_path: "wallet.privacy_mode",
        kind: FieldKind::Bool,
    },
    EnvMapping {
        var_name: "TOLLGATE_DUPLICATE_POLICY",
        field_path: "registry.duplicate_policy",
        kind: FieldKind::OneOf(DUPLICATE_POLICIES),
    },
    EnvMapping {
        var_name: "TOLLGATE_MAILBOX_CAPACITY",
        field_path: "mediator.mailbox_capacity",
        kind: FieldKind::Count {
            max: MAX_MAILBOX_CAPACITY as u64,
        },
    },
];

/// Apply environment fallbacks to fields that only the defaults layer set.
///
/// Values are checked against the field's accepted range or names before
/// they are merged. Anything else is skipped with a warning so that a stray
/// variable cannot break startup. Returns the number of
/// variables applied.
pub(crate) fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let Some(value) = coerce(mapping.kind, raw) else {
            warn!(
                var = mapping.var_name,
                value = %raw,
                "ignoring environment variable with unparsable value"
            );
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

fn coerce(kind: FieldKind, raw: &str) -> Option<toml::Value> {
    let raw = raw.trim();
    match kind {
        FieldKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(toml::Value::Boolean(true)),
            "false" | "0" | "no" | "off" => Some(toml::Value::Boolean(false)),
            _ => None,
        },
        FieldKind::Count { max } => raw
            .parse::<u64>()
            .ok()
            .filter(|n| (1..=max).contains(n))
            .and_then(|n| i64::try_from(n).ok())
            .map(toml::Value::Integer),
        FieldKind::OneOf(names) => {
            let lowered = raw.to_ascii_lowercase();
            if names.contains(&lowered.as_str()) {
                Some(toml::Value::String(lowered))
            } else {
                None
            }
        },
    }
}

/// Set a dotted `path` in the tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn defaults() -> (toml::Value, FieldSources) {
        let merged: toml::Value =
            toml::from_str("[wallet]\nprivacy_mode = true\n[logging]\nlevel = \"info\"\n")
                .unwrap();
        let mut sources = FieldSources::new();
        sources.insert("wallet.privacy_mode".to_owned(), ConfigLayer::Defaults);
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);
        (merged, sources)
    }

    #[test]
    fn test_env_fills_default_fields() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[
            ("TOLLGATE_PRIVACY_MODE", "off"),
            ("TOLLGATE_LOG_LEVEL", "debug"),
            ("TOLLGATE_MAILBOX_CAPACITY", "64"),
        ]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(applied, 3);
        assert_eq!(merged["wallet"]["privacy_mode"].as_bool(), Some(false));
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["mediator"]["mailbox_capacity"].as_integer(), Some(64));
        assert_eq!(
            sources.get("wallet.privacy_mode"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_does_not_override_file_values() {
        let (mut merged, mut sources) = defaults();
        sources.insert("wallet.privacy_mode".to_owned(), ConfigLayer::User);
        let env = make_env(&[("TOLLGATE_PRIVACY_MODE", "false")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["wallet"]["privacy_mode"].as_bool(), Some(true));
    }

    #[test]
    fn test_unparsable_values_are_skipped() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[
            ("TOLLGATE_PRIVACY_MODE", "maybe"),
            ("TOLLGATE_MAILBOX_CAPACITY", "lots"),
        ]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["wallet"]["privacy_mode"].as_bool(), Some(true));
        assert!(merged.get("mediator").is_none());
    }

    #[test]
    fn test_out_of_range_capacity_is_skipped() {
        for raw in ["-5", "0", "65537", "18446744073709551616"] {
            let (mut merged, mut sources) = defaults();
            let env = make_env(&[("TOLLGATE_MAILBOX_CAPACITY", raw)]);
            assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0, "{raw}");
            assert!(merged.get("mediator").is_none(), "{raw}");
        }

        let (mut merged, mut sources) = defaults();
        let env = make_env(&[("TOLLGATE_MAILBOX_CAPACITY", "65536")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 1);
        assert_eq!(
            merged["mediator"]["mailbox_capacity"].as_integer(),
            Some(65_536)
        );
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[
            ("TOLLGATE_DUPLICATE_POLICY", "bogus"),
            ("TOLLGATE_LOG_LEVEL", "loud"),
            ("TOLLGATE_LOG_FORMAT", "xml"),
        ]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert!(merged.get("registry").is_none());
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Defaults));
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[
            ("TOLLGATE_DUPLICATE_POLICY", " Queue "),
            ("TOLLGATE_LOG_LEVEL", "WARN"),
        ]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 2);
        assert_eq!(merged["registry"]["duplicate_policy"].as_str(), Some("queue"));
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[("HOME", "/home/x"), ("TOLLGATE_UNKNOWN", "1")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
    }
}
