use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api_connection::endpoints::{OPEN_FOOD_FACTS_DEFAULT_BASE_URL, USDA_DEFAULT_BASE_URL};
use crate::search::resolver::{ResolverOptions, DEFAULT_MAX_RESULTS, DEFAULT_SOURCE_TIMEOUT};

pub const USDA_API_KEY_ENV_VAR: &str = "USDA_API_KEY";
pub const USDA_BASE_URL_ENV_VAR: &str = "USDA_BASE_URL";
pub const OPEN_FOOD_FACTS_BASE_URL_ENV_VAR: &str = "OPENFOODFACTS_BASE_URL";
pub const SOURCE_TIMEOUT_ENV_VAR: &str = "SOURCE_TIMEOUT_SECS";
pub const MAX_RESULTS_ENV_VAR: &str = "MAX_SEARCH_RESULTS";
pub const LOCAL_FOODS_CSV_ENV_VAR: &str = "LOCAL_FOODS_CSV";
pub const DATA_DIR_ENV_VAR: &str = "CALORIE_TRACKER_DATA_DIR";

/// FoodData Central's shared, heavily rate-limited key.
pub const USDA_DEMO_KEY: &str = "DEMO_KEY";
const DEFAULT_DATA_DIR: &str = "./data";
const MAX_SOURCE_TIMEOUT_SECS: f64 = 3600.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}='{value}' is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub usda_api_key: String,
    pub usda_base_url: String,
    pub open_food_facts_base_url: String,
    pub source_timeout: Duration,
    pub max_results: usize,
    /// Replaces the built-in curated table when set.
    pub local_foods_csv: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            usda_api_key: USDA_DEMO_KEY.to_string(),
            usda_base_url: USDA_DEFAULT_BASE_URL.to_string(),
            open_food_facts_base_url: OPEN_FOOD_FACTS_DEFAULT_BASE_URL.to_string(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            max_results: DEFAULT_MAX_RESULTS,
            local_foods_csv: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl TrackerConfig {
    /// Reads the process environment after loading `.env`, if any.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a config from any variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let source_timeout = match get(SOURCE_TIMEOUT_ENV_VAR) {
            Some(raw) => {
                let secs: f64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: SOURCE_TIMEOUT_ENV_VAR,
                    value: raw.clone(),
                    reason: "expected a number of seconds",
                })?;
                if !secs.is_finite() || secs <= 0.0 || secs > MAX_SOURCE_TIMEOUT_SECS {
                    return Err(ConfigError::InvalidValue {
                        var: SOURCE_TIMEOUT_ENV_VAR,
                        value: raw,
                        reason: "must be between 0 and 3600 seconds",
                    });
                }
                Duration::from_secs_f64(secs)
            }
            None => defaults.source_timeout,
        };

        let max_results = match get(MAX_RESULTS_ENV_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: MAX_RESULTS_ENV_VAR,
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => defaults.max_results,
        };

        Ok(Self {
            usda_api_key: get(USDA_API_KEY_ENV_VAR).unwrap_or(defaults.usda_api_key),
            usda_base_url: get(USDA_BASE_URL_ENV_VAR).unwrap_or(defaults.usda_base_url),
            open_food_facts_base_url: get(OPEN_FOOD_FACTS_BASE_URL_ENV_VAR)
                .unwrap_or(defaults.open_food_facts_base_url),
            source_timeout,
            max_results,
            local_foods_csv: get(LOCAL_FOODS_CSV_ENV_VAR).map(PathBuf::from),
            data_dir: get(DATA_DIR_ENV_VAR).map(PathBuf::from).unwrap_or(defaults.data_dir),
        })
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_results: self.max_results,
            per_source_timeout: self.source_timeout,
        }
    }
}
