//! Command-line configuration.
//!
//! Settings come from the environment (a `.env` file is loaded first by the
//! binary) and are then overridden by command-line flags.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

use crate::error::ConfigError;

/// Log level variable (`error`, `warn`, `info`, `debug`, `trace` or `off`).
pub const LOG_VAR: &str = "CSVTRANS_LOG";

/// Default column matrix file used by `csvtrans run`.
pub const MATRIX_VAR: &str = "CSVTRANS_MATRIX";

/// Settings for one invocation of the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_level: LevelFilter,
    pub matrix: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Info,
            matrix: None,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(value) = lookup(LOG_VAR).filter(|v| !v.trim().is_empty()) {
            settings.log_level =
                LevelFilter::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                    var: LOG_VAR,
                    value,
                })?;
        }

        settings.matrix = lookup(MATRIX_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(settings)
    }

    /// Raise the level to `debug` when `-v` was given.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose && self.log_level < LevelFilter::Debug {
            self.log_level = LevelFilter::Debug;
        }
        self
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
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_reads_variables() {
        let settings = Settings::from_lookup(lookup(&[
            (LOG_VAR, "Trace"),
            (MATRIX_VAR, "matrices/catalog.json"),
        ]))
        .unwrap();
        assert_eq!(settings.log_level, LevelFilter::Trace);
        assert_eq!(settings.matrix, Some(PathBuf::from("matrices/catalog.json")));
    }

    #[test]
    fn test_invalid_level() {
        let err = Settings::from_lookup(lookup(&[(LOG_VAR, "loud")])).unwrap_err();
        assert!(err.to_string().contains(LOG_VAR));
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_verbose_only_raises() {
        let settings = Settings::default().with_verbose(true);
        assert_eq!(settings.log_level, LevelFilter::Debug);

        let trace = Settings {
            log_level: LevelFilter::Trace,
            matrix: None,
        };
        assert_eq!(trace.with_verbose(true).log_level, LevelFilter::Trace);
    }
}
