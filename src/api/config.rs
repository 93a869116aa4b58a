//! Parameter resolution: built-in defaults, then a YAML file, then flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::{ParameterSet, ProjectionError};

/// Read when no `--config-file` is given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// A partial parameter set; `Some` fields replace the base value.
///
/// Key names written by older releases are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub birth_year: Option<i32>,
    pub life_span: Option<u32>,
    pub retirement_age: Option<u32>,
    #[serde(alias = "cur_yearly_salary")]
    pub yearly_salary: Option<f64>,
    #[serde(alias = "yearly_salary_increase_pct")]
    pub salary_growth_rate: Option<f64>,
    #[serde(alias = "yearly_investment_return_during_career")]
    pub career_return_rate: Option<f64>,
    #[serde(alias = "yearly_investment_return_during_retirement")]
    pub retirement_return_rate: Option<f64>,
    pub upfront_investment: Option<f64>,
    #[serde(alias = "yearly_retirement_contribution_ratio")]
    pub contribution_ratio: Option<f64>,
}

impl ConfigOverrides {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&self, base: ParameterSet) -> ParameterSet {
        let mut params = base;
        if let Some(v) = self.birth_year {
            params.birth_year = v;
        }
        if let Some(v) = self.life_span {
            params.life_span = v;
        }
        if let Some(v) = self.retirement_age {
            params.retirement_age = v;
        }
        if let Some(v) = self.yearly_salary {
            params.yearly_salary = v;
        }
        if let Some(v) = self.salary_growth_rate {
            params.salary_growth_rate = v;
        }
        if let Some(v) = self.career_return_rate {
            params.career_return_rate = v;
        }
        if let Some(v) = self.retirement_return_rate {
            params.retirement_return_rate = v;
        }
        if let Some(v) = self.upfront_investment {
            params.upfront_investment = v;
        }
        if let Some(v) = self.contribution_ratio {
            params.contribution_ratio = v;
        }
        params
    }
}

/// Merges defaults, the config file and `overrides`, then validates.
pub fn resolve_parameters(
    config_file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ParameterSet, ConfigError> {
    let file_overrides = match config_file {
        Some(path) => {
            info!(path = %path.display(), "loading config file");
            ConfigOverrides::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            info!(path = DEFAULT_CONFIG_FILE, "loading default config file");
            ConfigOverrides::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => {
            debug!("no config file, using built-in defaults");
            ConfigOverrides::default()
        }
    };

    let params = overrides.apply(file_overrides.apply(ParameterSet::default()));
    params.validate()?;
    debug!(?params, "resolved parameters");
    Ok(params)
}

pub fn default_config_yaml() -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(&ParameterSet::default())?)
}

pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let yaml = default_config_yaml()?;
    fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}
