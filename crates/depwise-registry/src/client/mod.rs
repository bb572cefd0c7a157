//! HTTP client implementation with connection pooling and retry logic

use std::time::Duration;

use depwise_core::error::DepwiseError;
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::debug;
use url::Url;

use crate::api::PackageMetadataResponse;
use crate::{RegistryResult, DEFAULT_REGISTRY};

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Authentication configuration for registry access
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for authentication
    pub token: Option<String>,
}

/// HTTP client for npm registry metadata
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Base registry URL, without trailing slash
    base_url: String,
}

impl RegistryClient {
    /// Create new registry client for the public registry
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(DEFAULT_REGISTRY, AuthConfig::default(), RetryConfig::default())
    }

    /// Create registry client with authentication
    pub fn with_auth(auth: AuthConfig) -> RegistryResult<Self> {
        Self::with_config(DEFAULT_REGISTRY, auth, RetryConfig::default())
    }

    /// Create registry client with custom configuration
    pub fn with_config(
        base_url: &str,
        auth: AuthConfig,
        retry_config: RetryConfig,
    ) -> RegistryResult<Self> {
        let base_url = validate_base_url(base_url)?;

        let mut builder = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(Duration::from_secs(30))
            // Enable gzip compression
            .gzip(true)
            // User agent
            .user_agent(concat!("depwise/", env!("CARGO_PKG_VERSION")));

        // Configure authentication if provided
        if let Some(token) = auth.token {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token)
                    .parse::<reqwest::header::HeaderValue>()
                    .map_err(|e| {
                        DepwiseError::network(format!("Invalid auth token: {}", e), e)
                    })?,
            );
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|e| {
            DepwiseError::network(format!("Failed to create HTTP client: {}", e), e)
        })?;

        Ok(Self {
            client,
            retry_config,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            // Don't retry on final attempt or on definitive answers
            if attempt >= self.retry_config.max_retries || !error.is_recoverable() {
                return Err(error);
            }

            debug!(attempt, ?delay, "Retrying registry request: {}", error);
            tokio::time::sleep(delay).await;
            attempt += 1;

            delay = std::cmp::min(
                Duration::from_millis(
                    (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                ),
                self.retry_config.max_delay,
            );
        }
    }

    /// Fetch package metadata with retry logic
    pub async fn fetch_metadata(&self, package_name: &str) -> RegistryResult<PackageMetadataResponse> {
        let url = format!("{}/{}", self.base_url, encode_package_name(package_name));

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .header("Accept", "application/vnd.npm.install-v1+json")
                .send()
                .await
                .map_err(|e| DepwiseError::network(format!("Failed to fetch metadata: {}", e), e))?;

            match response.status() {
                StatusCode::OK => response
                    .json::<PackageMetadataResponse>()
                    .await
                    .map_err(|e| {
                        DepwiseError::network(format!("Failed to parse metadata: {}", e), e)
                    }),
                StatusCode::NOT_FOUND => Err(DepwiseError::PackageNotFound {
                    name: package_name.to_string(),
                }),
                status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                    Err(DepwiseError::Unauthorized {
                        name: package_name.to_string(),
                        reason: status.to_string(),
                    })
                }
                status => Err(DepwiseError::Network {
                    message: format!("Registry returned status {}: {}", status, package_name),
                    source: None,
                }),
            }
        })
        .await
    }
}

/// Encode package name for URL (handle scoped packages)
fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        // Scoped package: @org/pkg -> @org%2fpkg
        name.replace('/', "%2f")
    } else {
        name.to_string()
    }
}

fn validate_base_url(base_url: &str) -> RegistryResult<String> {
    let parsed = Url::parse(base_url).map_err(|e| DepwiseError::ConfigValidation {
        field: "registry.url".to_string(),
        reason: format!("'{}' is not a valid URL: {}", base_url, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DepwiseError::ConfigValidation {
            field: "registry.url".to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests;
