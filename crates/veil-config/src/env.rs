//! `VEIL_*` environment variable fallbacks.
//!
//! Variables are fallbacks, not overrides: one is applied only when no config
//! file set the field it maps to.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

#[derive(Clone, Copy)]
enum FieldKind {
    String,
    Integer,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VEIL_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "VEIL_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "VEIL_OUTPUT_ENCODING",
        field_path: "output.encoding",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "VEIL_PBKDF2_ITERATIONS",
        field_path: "kdf.pbkdf2_iterations",
        kind: FieldKind::Integer,
    },
];

/// Snapshot of the process's `VEIL_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("VEIL_"))
        .collect()
}

/// Apply fallbacks for fields no config file set.
///
/// Returns how many variables were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
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

        let value = match mapping.kind {
            FieldKind::String => toml::Value::String(raw.trim().to_owned()),
            FieldKind::Integer => {
                let n: i64 = raw.trim().parse().map_err(|_| ConfigError::EnvError {
                    var_name: mapping.var_name.to_owned(),
                    message: format!("expected an integer, got '{raw}'"),
                })?;
                toml::Value::Integer(n)
            },
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_nested(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn set_nested(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_fallback_fills_defaulted_field() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &vars(&[("VEIL_LOG_LEVEL", "debug")]),
        )
        .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(
            sources.get("logging.level"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_file_value_wins_over_env() {
        let mut merged: toml::Value = toml::from_str("[output]\nencoding = \"hex\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("output.encoding".to_owned(), ConfigLayer::User);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &vars(&[("VEIL_OUTPUT_ENCODING", "base64")]),
        )
        .unwrap();

        assert_eq!(applied, 0);
        assert_eq!(merged["output"]["encoding"].as_str(), Some("hex"));
    }

    #[test]
    fn test_integer_fallback_creates_section() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();

        apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &vars(&[("VEIL_PBKDF2_ITERATIONS", " 4096 ")]),
        )
        .unwrap();

        assert_eq!(merged["kdf"]["pbkdf2_iterations"].as_integer(), Some(4096));
    }

    #[test]
    fn test_bad_integer_is_env_error() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();

        let err = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &vars(&[("VEIL_PBKDF2_ITERATIONS", "many")]),
        )
        .unwrap_err();

        assert!(
            matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "VEIL_PBKDF2_ITERATIONS")
        );
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &vars(&[("VEIL_UNKNOWN", "1"), ("HOME", "/root")]),
        )
        .unwrap();
        assert_eq!(applied, 0);
    }
}
