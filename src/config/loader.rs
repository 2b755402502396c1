//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading statutory rate
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::calculation::TaxScale;
use crate::error::{EngineError, EngineResult};

use super::types::{BonusSettings, DeductionSettings, EngineConfig, TaxScaleConfig};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory and
/// exposes the tax scale and the deduction and bonus settings.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/au_2024_25/
/// ├── tax_scale.yaml   # Metadata and income tax brackets
/// ├── deductions.yaml  # Child support, union fee and packaging settings
/// └── bonuses.yaml     # Superannuation, Medicare, fixed rate, ETP, performance table
/// ```
///
/// # Example
///
/// ```no_run
/// use compensation_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/au_2024_25").unwrap();
/// let tax = loader.config().tax_scale().tax_on_annual_income(Decimal::new(80000, 0));
/// println!("Tax on $80,000: ${}", tax);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/au_2024_25")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The tax brackets do not form a valid scale
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let tax_scale_path = path.join("tax_scale.yaml");
        let tax_scale_config = Self::load_yaml::<TaxScaleConfig>(&tax_scale_path)?;
        let tax_scale =
            TaxScale::new(tax_scale_config.brackets).map_err(|e| EngineError::ConfigParseError {
                path: tax_scale_path.display().to_string(),
                message: e.to_string(),
            })?;

        let deductions = Self::load_yaml::<DeductionSettings>(&path.join("deductions.yaml"))?;
        let bonuses = Self::load_yaml::<BonusSettings>(&path.join("bonuses.yaml"))?;

        debug!(
            path = %path.display(),
            financial_year = %tax_scale_config.metadata.financial_year,
            brackets = tax_scale.brackets().len(),
            "Loaded engine configuration"
        );

        Ok(Self {
            config: EngineConfig::new(tax_scale_config.metadata, tax_scale, deductions, bonuses),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
