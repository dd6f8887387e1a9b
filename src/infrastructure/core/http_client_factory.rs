use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Plain client. Used for multipart uploads, whose bodies cannot be replayed.
    pub fn create_client() -> Client {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new())
    }

    /// Client with transient-error retry middleware
    pub fn create_retrying_client() -> ClientWithMiddleware {
        // Exponential backoff, max 3 retries
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        ClientBuilder::new(Self::create_client())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}
