//! HTTP server configuration parsing from environment variables.

/// Server environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8071,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind_address: var("SERVER_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: var("SERVER_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            max_upload_bytes: var("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
