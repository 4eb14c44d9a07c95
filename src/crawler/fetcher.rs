//! Shared HTTP client for asset downloads
//!
//! One client is built per run and shared by every unit so connections are
//! pooled; the driver drops it once all work has completed.

use crate::config::{AssetConfig, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client used for asset downloads
///
/// # Arguments
///
/// * `user_agent` - Browser-like user agent, identical to the one page sessions present
/// * `assets` - Asset settings supplying the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use learn_archiver::config::{AssetConfig, UserAgentConfig};
/// use learn_archiver::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &AssetConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    assets: &AssetConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.as_str())
        .timeout(Duration::from_millis(assets.request_timeout))
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_sends_configured_user_agent() {
        let server = MockServer::start().await;
        let user_agent = UserAgentConfig {
            value: "Mozilla/5.0 (learn-archiver test)".to_string(),
        };

        Mock::given(method("GET"))
            .and(header("user-agent", "Mozilla/5.0 (learn-archiver test)"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&user_agent, &AssetConfig::default()).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
