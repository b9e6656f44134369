//! CLI configuration from flags and environment
//!
//! - `DUNYA_SERVER_URL` - server base URL (default `http://localhost:8000`)
//! - `DUNYA_API_TOKEN` - API token sent as `Authorization: Token <key>`
//! - `DUNYA_API_TIMEOUT_SECS` - request timeout (default 300)

use std::time::Duration;

use crate::error::{CliError, Result};

/// Default server URL when none is given
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Long enough for large audio downloads
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl CliConfig {
    pub fn new(server_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let timeout_secs = match std::env::var("DUNYA_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CliError::Config(format!("DUNYA_API_TIMEOUT_SECS is not a number: '{}'", raw))
            })?,
            Err(_) => DEFAULT_API_TIMEOUT_SECS,
        };
        Self::with_timeout(server_url, token, Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let server_url = server_url.into().trim().trim_end_matches('/').to_string();
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(CliError::Config(format!(
                "Server URL must start with http:// or https://, got '{}'",
                server_url
            )));
        }

        Ok(Self {
            server_url,
            token: token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            timeout,
        })
    }
}
