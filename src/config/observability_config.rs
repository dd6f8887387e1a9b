//! Observability configuration parsing from environment variables.
//!
//! This module handles loading the metrics reporter settings.

/// Observability environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            enabled: var("OBSERVABILITY_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            interval_seconds: var("OBSERVABILITY_INTERVAL")
                .unwrap_or_else(|| "60".to_string())
                .parse::<u64>()
                .unwrap_or(60),
        }
    }
}
