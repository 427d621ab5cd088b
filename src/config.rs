//! Runtime configuration.
//!
//! Loaded from a TOML file (an explicit path, or `./grid-severity.toml` when
//! present), then overridden by environment variables:
//! - `GRID_SEVERITY_MODERATE_FROM` / `GRID_SEVERITY_HIGH_FROM` - band boundaries
//! - `GRID_SEVERITY_FALLBACK` - `fail` or `assume_low`
//! - `GRID_SEVERITY_LOG` - tracing filter directive
//!
//! ```toml
//! log_filter = "info"
//! fallback = "fail"
//!
//! [bands]
//! moderate_from = 30.0
//! high_from = 60.0
//!
//! [operators]
//! defuzz_op = "centroid"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inference::Operators;
use crate::severity::{Fallback, SeverityBands};

pub const DEFAULT_CONFIG_FILE: &str = "grid-severity.toml";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const LOG_ENV: &str = "GRID_SEVERITY_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bands: SeverityBands,
    pub fallback: Fallback,
    pub operators: Operators,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bands: SeverityBands::default(),
            fallback: Fallback::default(),
            operators: Operators::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl Config {
    /// Reads `path`, or `./grid-severity.toml` when `path` is `None` and the
    /// file exists, applies environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);

                if local.exists() {
                    Self::load_from_file(local)?
                } else {
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        debug!(path = %path.display(), "loading config");

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            message: e.to_string(),
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Applies `GRID_SEVERITY_*` overrides, reading them through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        fn number(key: &str, raw: String) -> Result<f64, ConfigError> {
            raw.trim().parse().map_err(|_| ConfigError::Validation {
                field: key.to_owned(),
                message: format!("`{raw}` is not a number"),
            })
        }

        if let Some(raw) = lookup("GRID_SEVERITY_MODERATE_FROM") {
            self.bands.moderate_from = number("GRID_SEVERITY_MODERATE_FROM", raw)?;
        }
        if let Some(raw) = lookup("GRID_SEVERITY_HIGH_FROM") {
            self.bands.high_from = number("GRID_SEVERITY_HIGH_FROM", raw)?;
        }
        if let Some(raw) = lookup("GRID_SEVERITY_FALLBACK") {
            self.fallback = match raw.trim() {
                "fail" => Fallback::Fail,
                "assume_low" => Fallback::AssumeLow,
                other => {
                    return Err(ConfigError::Validation {
                        field: "GRID_SEVERITY_FALLBACK".to_owned(),
                        message: format!("expected `fail` or `assume_low`, got `{other}`"),
                    })
                },
            };
        }
        if let Some(raw) = lookup(LOG_ENV) {
            self.log_filter = raw;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bands.validate().map_err(|e| ConfigError::Validation {
            field: "bands".to_owned(),
            message: e.to_string(),
        })?;

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "log_filter".to_owned(),
                message: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

#[test]
fn test_config_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.bands, SeverityBands::SERVICE);
    assert_eq!(config.fallback, Fallback::Fail);
    assert_eq!(config.operators, Operators::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_toml() {
    use crate::ops::{DefuzzificationOp, ImplicationOp};

    let config = Config::from_toml(
        r#"
        fallback = "assume_low"
        log_filter = "grid_severity=trace"

        [bands]
        moderate_from = 30.0
        high_from = 70.0

        [operators]
        imp_op = "prod"
        defuzz_op = "mean_of_maximum"
        "#,
    )
    .unwrap();

    assert_eq!(config.bands, SeverityBands::CONSOLE);
    assert_eq!(config.fallback, Fallback::AssumeLow);
    assert_eq!(config.operators.imp_op, ImplicationOp::Prod);
    assert_eq!(config.operators.defuzz_op, DefuzzificationOp::MeanOfMaximum);
    assert_eq!(config.log_filter, "grid_severity=trace");
    assert!(matches!(
        Config::from_toml("[operators]\ndefuzz_op = \"median\""),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_config_overrides() {
    let mut config = Config::default();
    let env = |key: &str| match key {
        "GRID_SEVERITY_HIGH_FROM" => Some("70".to_owned()),
        "GRID_SEVERITY_FALLBACK" => Some("assume_low".to_owned()),
        _ => None,
    };

    config.apply_overrides(env).unwrap();

    assert_eq!(config.bands, SeverityBands::CONSOLE);
    assert_eq!(config.fallback, Fallback::AssumeLow);
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);

    let bad = |key: &str| (key == "GRID_SEVERITY_MODERATE_FROM").then(|| "lots".to_owned());

    assert!(matches!(
        config.apply_overrides(bad),
        Err(ConfigError::Validation { .. })
    ));

    config.bands.moderate_from = 80.;

    assert!(config.validate().is_err());
}
