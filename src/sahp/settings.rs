//! Settings module for sahp-rs configuration.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Base seed for the deterministic RNG context.
    pub default_seed: u64,

    /// Default number of Monte Carlo samples per inter-event interval.
    pub mc_samples: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_seed: 42,
            mc_samples: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingSettings {
    /// Force determinism tests to run regardless of platform.
    /// Set to true to run tests on non-reference platforms.
    pub force_determinism_tests: bool,

    /// Indicates if running in continuous integration environment.
    /// Typically set by CI systems (e.g., GitHub Actions).
    pub ci: bool,
}

impl Default for TestingSettings {
    fn default() -> Self {
        Self {
            force_determinism_tests: false,
            ci: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Model/likelihood settings
    pub model: ModelSettings,

    /// Testing/Development settings
    pub testing: TestingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            testing: TestingSettings::default(),
        }
    }
}

impl Settings {
    /// Create a new Settings instance from environment variables and config files.
    /// Environment variables are prefixed with "SAHP_".
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("model.default_seed", 42u64)?
            .set_default("model.mc_samples", 100u64)?
            .set_default("testing.force_determinism_tests", false)?
            .set_default("testing.ci", false)?
            // Add configuration from .env file if it exists
            .add_source(File::with_name(".env").required(false))
            // Add environment variables with SAHP_ prefix
            .add_source(Environment::with_prefix("SAHP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

/// Global settings instance
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Get the global settings instance, initializing it if necessary.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| Settings::new().unwrap_or_else(|_| Settings::default()))
}
