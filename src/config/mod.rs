//! Configuration loading and management for the compensation engine.
//!
//! This module provides functionality to load statutory rates from YAML
//! files: the income tax scale, deduction formula settings and bonus
//! withholding settings.
//!
//! # Example
//!
//! ```no_run
//! use compensation_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/au_2024_25").unwrap();
//! println!("Loaded rates for: {}", config.config().metadata().financial_year);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BonusSettings, ChildSupportRates, DeductionSettings, EngineConfig, EtpSettings,
    ScaleMetadata, TaxScaleConfig, UnionFeeDefaults,
};
