//! Unit tests for registry client

use super::*;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::with_config(&server.uri(), AuthConfig::default(), fast_retry()).unwrap()
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.base_url(), "https://registry.npmjs.org");
    assert_eq!(client.retry_config.max_retries, 3);
}

#[tokio::test]
async fn test_registry_client_with_auth() {
    let auth = AuthConfig {
        token: Some("test-token".to_string()),
    };

    let client = RegistryClient::with_auth(auth).unwrap();
    assert_eq!(client.base_url(), "https://registry.npmjs.org");
}

#[test]
fn test_base_url_validation() {
    let client = RegistryClient::with_config(
        "https://npm.example.com/",
        AuthConfig::default(),
        RetryConfig::default(),
    )
    .unwrap();
    assert_eq!(client.base_url(), "https://npm.example.com");

    let err = RegistryClient::with_config("not a url", AuthConfig::default(), RetryConfig::default())
        .unwrap_err();
    assert!(matches!(err, DepwiseError::ConfigValidation { .. }));

    let err = RegistryClient::with_config("ftp://npm.example.com", AuthConfig::default(), RetryConfig::default())
        .unwrap_err();
    assert!(matches!(err, DepwiseError::ConfigValidation { .. }));
}

#[test]
fn test_encode_package_name() {
    // Regular package
    assert_eq!(encode_package_name("lodash"), "lodash");

    // Scoped package
    assert_eq!(encode_package_name("@types/node"), "@types%2fnode");
}

#[test]
fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert_eq!(config.multiplier, 2.0);
}

#[tokio::test]
async fn test_fetch_metadata_success() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "name": "test-package",
        "dist-tags": {
            "latest": "1.0.0"
        },
        "versions": {
            "1.0.0": {
                "version": "1.0.0",
                "peerDependencies": { "react": "^18.0.0" },
                "deprecated": "use other-package"
            }
        },
        "modified": "2023-01-01T00:00:00.000Z"
    });

    Mock::given(method("GET"))
        .and(path("/test-package"))
        .and(header("Accept", "application/vnd.npm.install-v1+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let metadata = client.fetch_metadata("test-package").await.unwrap();
    assert_eq!(metadata.name, "test-package");
    assert_eq!(metadata.latest(), Some("1.0.0"));
    assert_eq!(metadata.deprecation("1.0.0"), Some("use other-package"));
    assert_eq!(
        metadata.versions["1.0.0"].peer_dependencies.get("react").map(String::as_str),
        Some("^18.0.0")
    );
}

#[tokio::test]
async fn test_fetch_metadata_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nonexistent-package"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let result = client.fetch_metadata("nonexistent-package").await;
    match result.unwrap_err() {
        DepwiseError::PackageNotFound { name } => {
            assert_eq!(name, "nonexistent-package");
        }
        other => panic!("Expected PackageNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_metadata_unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@private%2fpkg"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let err = client.fetch_metadata("@private/pkg").await.unwrap_err();
    assert!(matches!(err, DepwiseError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let err = client.fetch_metadata("flaky").await.unwrap_err();
    assert!(matches!(err, DepwiseError::Network { .. }));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "secret",
            "dist-tags": { "latest": "0.1.0" },
            "versions": {}
        })))
        .mount(&mock_server)
        .await;

    let auth = AuthConfig {
        token: Some("s3cret".to_string()),
    };
    let client = RegistryClient::with_config(&mock_server.uri(), auth, fast_retry()).unwrap();

    let metadata = client.fetch_metadata("secret").await.unwrap();
    assert_eq!(metadata.latest(), Some("0.1.0"));
}

#[tokio::test]
async fn test_scoped_package_url_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@types%2fnode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "@types/node",
            "dist-tags": { "latest": "1.0.0" },
            "versions": {},
            "time": {}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let result = client.fetch_metadata("@types/node").await;
    assert!(result.is_ok());
}
