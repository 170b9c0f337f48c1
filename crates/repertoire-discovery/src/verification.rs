//! Client for the internal verification agent.
//!
//! The agent is an authenticated internal endpoint consulted only when no
//! PRO reported a work. It answers `null` (or 404) when it knows nothing.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use repertoire_core::model::clean_iswc;

use crate::config::Config;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::repertoire::{credits, ExtractedCredit};
use crate::services::{VerificationResult, VerificationService};

const SOURCE_NAME: &str = "Verification agent";

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    title: &'a str,
    writer: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    iswc: Option<String>,
    #[serde(default)]
    writers: Vec<ExtractedCredit>,
    #[serde(default)]
    publishers: Vec<ExtractedCredit>,
    #[serde(default)]
    sources: Vec<String>,
}

impl From<VerifyResponse> for VerificationResult {
    fn from(response: VerifyResponse) -> Self {
        Self {
            iswc: clean_iswc(response.iswc),
            writers: credits(response.writers),
            publishers: credits(response.publishers),
            sources: response.sources,
        }
    }
}

/// HTTP client for the verification agent.
#[derive(Debug, Clone)]
pub struct VerificationAgentClient {
    http: Client,
    endpoint: String,
    secret: String,
}

impl VerificationAgentClient {
    pub fn new(
        config: &Config,
        endpoint: impl Into<String>,
        secret: impl Into<String>,
    ) -> DiscoveryResult<Self> {
        let http = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            secret: secret.into(),
        })
    }

    /// Build a client when both `verification_url` and
    /// `verification_secret` are configured.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> DiscoveryResult<Option<Self>> {
        match (&config.verification_url, &config.verification_secret) {
            (Some(url), Some(secret)) if !url.trim().is_empty() => {
                Self::new(config, url.trim(), secret.as_str()).map(Some)
            }
            (Some(_), None) => {
                log::warn!("verification_url is set without verification_secret; agent disabled");
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl VerificationService for VerificationAgentClient {
    async fn verify(
        &self,
        work_title: &str,
        writer_name: &str,
    ) -> DiscoveryResult<Option<VerificationResult>> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.secret)
            .json(&VerifyRequest {
                title: work_title,
                writer: writer_name,
            })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| DiscoveryError::http(SOURCE_NAME, e))?;

        let body: Option<VerifyResponse> = response
            .json()
            .await
            .map_err(|e| DiscoveryError::parse(SOURCE_NAME, e))?;

        Ok(body.map(VerificationResult::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_url() {
        let client = VerificationAgentClient::from_config(&Config::default()).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn test_disabled_without_secret() {
        let config = Config {
            verification_url: Some("https://verify.internal/verify".to_string()),
            ..Config::default()
        };
        assert!(VerificationAgentClient::from_config(&config)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_enabled_with_url_and_secret() {
        let config = Config {
            verification_url: Some("https://verify.internal/verify".to_string()),
            verification_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        assert!(VerificationAgentClient::from_config(&config)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_response_narrowing() {
        let payload = r#"{
            "iswc": " ",
            "writers": ["Jane Doe", {"name": "John Roe", "share": 50}],
            "publishers": [{"name": "Doe Songs", "share": "25%"}],
            "sources": ["internal-db"]
        }"#;
        let response: VerifyResponse = serde_json::from_str(payload).unwrap();
        let result = VerificationResult::from(response);
        assert!(result.iswc.is_none());
        assert_eq!(result.writers.len(), 2);
        assert_eq!(result.writers[1].share, Some(50.0));
        assert_eq!(result.publishers[0].share, Some(25.0));
    }

    #[test]
    fn test_null_response_is_none() {
        let body: Option<VerifyResponse> = serde_json::from_str("null").unwrap();
        assert!(body.is_none());
    }
}
