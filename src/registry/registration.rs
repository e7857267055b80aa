//! Self-registration of a domain service.
//!
//! Every domain service announces itself once at startup. Attempts are
//! bounded; when they run out the service keeps serving but stays invisible
//! to the gateway until it is restarted.

use thiserror::Error;

use crate::config::RegistrationConfig;
use crate::observability::metrics;
use crate::registry::client::{DiscoveryError, RegistryClient};
use crate::resilience::retries::{retry_fixed, RetryPolicy};

/// Registration did not succeed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("registration of '{service}' abandoned after {attempts} attempts: {last_error}")]
    Exhausted {
        service: String,
        attempts: u32,
        #[source]
        last_error: DiscoveryError,
    },
}

impl From<&RegistrationConfig> for RetryPolicy {
    fn from(config: &RegistrationConfig) -> Self {
        RetryPolicy::new(config.max_attempts, config.retry_delay())
    }
}

/// Register `name → address`, retrying per `policy`.
///
/// Returns the number of attempts it took.
pub async fn register_with_retry(
    client: &RegistryClient,
    name: &str,
    address: &str,
    policy: RetryPolicy,
) -> Result<u32, RegistrationError> {
    let outcome = retry_fixed(policy, move |attempt| async move {
        tracing::debug!(service = %name, attempt, registry = %client.base_url(), "Registering");
        let result = client.register(name, address).await;
        metrics::record_registration_attempt(result.is_ok());
        result
    })
    .await;

    match outcome {
        Ok((_, attempts)) => {
            tracing::info!(service = %name, url = %address, attempts, "Registered with registry");
            Ok(attempts)
        }
        Err(exhausted) => Err(RegistrationError::Exhausted {
            service: name.to_string(),
            attempts: exhausted.attempts,
            last_error: exhausted.last_error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exhausts_against_dead_registry() {
        let client = RegistryClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let err = register_with_retry(&client, "traffic_service", "http://traffic:8000", policy)
            .await
            .unwrap_err();

        let RegistrationError::Exhausted { service, attempts, last_error } = err;
        assert_eq!(service, "traffic_service");
        assert_eq!(attempts, 3);
        assert!(matches!(last_error, DiscoveryError::RegistryUnreachable(_)));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RegistrationConfig::default());
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
