//! Outbound HTTP client.

use std::time::Duration;

use crate::config::TimeoutConfig;

/// Build the client used for registry and downstream calls.
pub fn build_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .user_agent(concat!("city-mesh/", env!("CARGO_PKG_VERSION")))
        .build()
}
