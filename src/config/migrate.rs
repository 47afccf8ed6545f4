//! Configuration file checks: detect keys missing from an older file and
//! fill them with their defaults.

use super::Config;
use crate::errors::{AppError, AppResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Walk `defaults` and collect every key (dotted path) absent from `current`.
fn collect_missing(defaults: &Mapping, current: &Mapping, prefix: &str, out: &mut Vec<String>) {
    for (key, default_val) in defaults {
        let name = match key.as_str() {
            Some(k) if prefix.is_empty() => k.to_string(),
            Some(k) => format!("{}.{}", prefix, k),
            None => continue,
        };

        match (current.get(key), default_val) {
            (None, _) => out.push(name),
            (Some(Value::Mapping(cur)), Value::Mapping(def)) => {
                collect_missing(def, cur, &name, out);
            }
            _ => {}
        }
    }
}

/// Insert defaults for missing keys, recursing into nested sections.
/// Existing values are never overwritten.
fn fill_missing(defaults: &Mapping, current: &mut Mapping) -> bool {
    let mut changed = false;

    for (key, default_val) in defaults {
        match current.get_mut(key) {
            None => {
                current.insert(key.clone(), default_val.clone());
                changed = true;
            }
            Some(Value::Mapping(cur)) => {
                if let Value::Mapping(def) = default_val {
                    changed |= fill_missing(def, cur);
                }
            }
            Some(_) => {}
        }
    }

    changed
}

fn default_mapping() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default())? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default configuration is not a mapping".into())),
    }
}

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{:?} does not contain a YAML mapping",
            path
        ))),
    }
}

/// Keys the configuration file at `path` lacks compared to the defaults.
pub fn missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let defaults = default_mapping()?;
    let current = read_mapping(path)?;

    let mut missing = Vec::new();
    collect_missing(&defaults, &current, "", &mut missing);
    Ok(missing)
}

/// Rewrite the configuration file with missing keys filled in.
///   Returns:
///   Ok(true)  → config updated
///   Ok(false) → no change needed
pub fn run_config_migration(path: &Path) -> AppResult<bool> {
    let defaults = default_mapping()?;
    let mut current = read_mapping(path)?;

    if !fill_missing(&defaults, &mut current) {
        return Ok(false);
    }

    let serialized = serde_yaml::to_string(&Value::Mapping(current))?;
    fs::write(path, serialized).map_err(|_| AppError::ConfigSave)?;

    Ok(true)
}
