//! Wikipedia summary and Wikidata sitelink client.
//!
//! Used only by identity resolution to attach a short biography to a
//! songwriter. A missing article is `Ok(None)`, not an error.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resilience::{retry_transient, RateLimiter};
use crate::services::EncyclopediaService;

const WIKIPEDIA: &str = "Wikipedia";
const WIKIDATA: &str = "Wikidata";

#[derive(Debug, Deserialize)]
struct PageSummary {
    extract: Option<String>,
}

/// Wrapper for the Wikidata `Special:EntityData` JSON response.
#[derive(Debug, Deserialize)]
struct EntityDataWrapper {
    entities: HashMap<String, EntitySitelinks>,
}

#[derive(Debug, Deserialize)]
struct EntitySitelinks {
    #[serde(default)]
    sitelinks: HashMap<String, Sitelink>,
}

#[derive(Debug, Deserialize)]
struct Sitelink {
    title: String,
}

/// Client for the Wikipedia REST API and Wikidata entity data.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: Client,
    wikipedia_url: Url,
    wikidata_url: Url,
    rate_limiter: RateLimiter,
}

impl WikipediaClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    /// Returns an error if a base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: &Config) -> DiscoveryResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            wikipedia_url: parse_base(WIKIPEDIA, &config.wikipedia_url)?,
            wikidata_url: parse_base(WIKIDATA, &config.wikidata_url)?,
            rate_limiter: RateLimiter::new(5),
        })
    }

    async fn get_optional<T: DeserializeOwned>(
        &self,
        source_name: &str,
        url: &Url,
    ) -> DiscoveryResult<Option<T>> {
        retry_transient(source_name, move || async move {
            self.rate_limiter.acquire().await;

            let response = self.http.get(url.clone()).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => return Ok(None),
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(DiscoveryError::RateLimited {
                        source_name: source_name.to_string(),
                    })
                }
                _ => {}
            }

            let response = response
                .error_for_status()
                .map_err(|e| DiscoveryError::http(source_name, e))?;
            let body = response
                .json::<T>()
                .await
                .map_err(|e| DiscoveryError::parse(source_name, e))?;
            Ok(Some(body))
        })
        .await
    }
}

/// Parse a base URL, dropping any trailing slash so segments append cleanly.
fn parse_base(source_name: &str, raw: &str) -> DiscoveryResult<Url> {
    Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| DiscoveryError::parse(source_name, format!("invalid base URL {raw}: {e}")))
}

/// Append path segments to `base`, percent-encoding each one.
fn join_segments(source_name: &str, base: &Url, segments: &[&str]) -> DiscoveryResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| DiscoveryError::parse(source_name, format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl EncyclopediaService for WikipediaClient {
    async fn summary(&self, title: &str) -> DiscoveryResult<Option<String>> {
        let url = join_segments(WIKIPEDIA, &self.wikipedia_url, &["page", "summary", title])?;
        let page: Option<PageSummary> = self.get_optional(WIKIPEDIA, &url).await?;

        Ok(page
            .and_then(|p| p.extract)
            .map(|extract| extract.trim().to_string())
            .filter(|extract| !extract.is_empty()))
    }

    async fn title_for_wikidata(&self, qid: &str) -> DiscoveryResult<Option<String>> {
        let file = format!("{qid}.json");
        let url = join_segments(
            WIKIDATA,
            &self.wikidata_url,
            &["wiki", "Special:EntityData", &file],
        )?;
        let data: Option<EntityDataWrapper> = self.get_optional(WIKIDATA, &url).await?;

        Ok(data.and_then(|mut wrapper| {
            wrapper
                .entities
                .remove(qid)
                .or_else(|| wrapper.entities.into_values().next())
                .and_then(|mut entity| entity.sitelinks.remove("enwiki"))
                .map(|link| link.title)
        }))
    }
}
