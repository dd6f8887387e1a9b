//! Configuration module for crudeprice.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Paths, Training, Server and Observability.

mod observability_config;
mod paths_config;
mod server_config;
mod training_config;

pub use observability_config::ObservabilityEnvConfig;
pub use paths_config::{
    METRICS_FILE, PARTIAL_PREDICTIONS_FILE, PLOT_FILE, PREDICTIONS_FILE, PathsEnvConfig,
};
pub use server_config::ServerEnvConfig;
pub use training_config::TrainingEnvConfig;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PathsEnvConfig,
    pub training: TrainingEnvConfig,
    pub server: ServerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Reads the process environment. Callers load `.env` with dotenvy first.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            paths: PathsEnvConfig::from_vars(&var),
            training: TrainingEnvConfig::from_vars(&var)?,
            server: ServerEnvConfig::from_vars(&var),
            observability: ObservabilityEnvConfig::from_vars(&var),
        })
    }
}
