//! Runtime configuration, read from `POINTSWAP_*` environment variables.

use std::path::PathBuf;

use anyhow::Context;
use pointswap_ledger::{DEFAULT_WELCOME_BONUS, Points};
use pointswap_observability::LogFormat;
use pointswap_store::default_data_dir;

pub const DATA_DIR_VAR: &str = "POINTSWAP_DATA_DIR";
pub const WELCOME_BONUS_VAR: &str = "POINTSWAP_WELCOME_BONUS";
pub const ACTIVITY_LIMIT_VAR: &str = "POINTSWAP_ACTIVITY_LIMIT";
pub const LOG_FORMAT_VAR: &str = "POINTSWAP_LOG_FORMAT";

/// Size of the admin "recent activity" view.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSwapConfig {
    /// Directory for the file backend; `None` means the OS data directory.
    pub data_dir: Option<PathBuf>,
    pub welcome_bonus: Points,
    pub activity_limit: usize,
    pub log_format: LogFormat,
}

impl Default for PointSwapConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            welcome_bonus: DEFAULT_WELCOME_BONUS,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            log_format: LogFormat::default(),
        }
    }
}

impl PointSwapConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable source. Invalid values are logged
    /// and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let welcome_bonus = parse_or(&lookup, WELCOME_BONUS_VAR, defaults.welcome_bonus);
        let activity_limit = parse_or(&lookup, ACTIVITY_LIMIT_VAR, defaults.activity_limit);

        let log_format = match lookup(LOG_FORMAT_VAR) {
            None => defaults.log_format,
            Some(raw) => LogFormat::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("{LOG_FORMAT_VAR}={raw:?} is not a known format; using json");
                defaults.log_format
            }),
        };

        Self {
            data_dir,
            welcome_bonus,
            activity_limit,
            log_format,
        }
    }

    /// Configured data directory, or `{app_data_dir}/pointswap`.
    pub fn resolve_data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir().context("no POINTSWAP_DATA_DIR and no OS data directory"),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={raw:?} is invalid; using default {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = PointSwapConfig::from_lookup(lookup(&[]));
        assert_eq!(config, PointSwapConfig::default());
        assert_eq!(config.welcome_bonus, 100);
        assert_eq!(config.activity_limit, 50);
    }

    #[test]
    fn reads_every_variable() {
        let config = PointSwapConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/tmp/pointswap"),
            (WELCOME_BONUS_VAR, " 250 "),
            (ACTIVITY_LIMIT_VAR, "10"),
            (LOG_FORMAT_VAR, "compact"),
        ]));

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/pointswap")));
        assert_eq!(config.welcome_bonus, 250);
        assert_eq!(config.activity_limit, 10);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/pointswap"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = PointSwapConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "   "),
            (WELCOME_BONUS_VAR, "-5"),
            (ACTIVITY_LIMIT_VAR, "lots"),
            (LOG_FORMAT_VAR, "xml"),
        ]));
        assert_eq!(config, PointSwapConfig::default());
    }
}
