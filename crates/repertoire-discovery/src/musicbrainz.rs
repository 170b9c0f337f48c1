//! MusicBrainz web-service client.
//!
//! Implements [`CatalogService`] against the MusicBrainz JSON API. Every
//! call goes through a 1 req/sec [`RateLimiter`], as MusicBrainz requires,
//! and transient failures are retried with backoff.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use repertoire_core::model::RawWork;

use crate::config::Config;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resilience::{retry_transient, RateLimiter};
use crate::services::{
    ArtistDetail, CatalogArtist, CatalogService, UrlRelation, WorkDetail, WorkRelation, WorksPage,
};

const SOURCE_NAME: &str = "MusicBrainz";

/// Number of artists requested from an artist search.
const ARTIST_SEARCH_LIMIT: usize = 10;

/// MusicBrainz API client.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct MbArtistSearch {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbWorkBrowse {
    #[serde(default)]
    works: Vec<MbWork>,
    #[serde(rename = "work-count", default)]
    work_count: usize,
}

#[derive(Debug, Deserialize)]
struct MbWorkSearch {
    #[serde(default)]
    works: Vec<MbWork>,
    #[serde(default)]
    count: usize,
}

#[derive(Debug, Deserialize)]
struct MbWork {
    id: String,
    title: String,
    #[serde(default)]
    iswcs: Vec<String>,
    #[serde(default)]
    relations: Vec<MbRelation>,
}

#[derive(Debug, Deserialize)]
struct MbRelation {
    #[serde(rename = "type")]
    relation_type: String,
    artist: Option<MbRelatedArtist>,
    url: Option<MbUrl>,
}

#[derive(Debug, Deserialize)]
struct MbRelatedArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MbUrl {
    resource: String,
}

#[derive(Debug, Deserialize)]
struct MbArtistLookup {
    country: Option<String>,
    area: Option<MbArea>,
    #[serde(default)]
    relations: Vec<MbRelation>,
}

#[derive(Debug, Deserialize)]
struct MbArea {
    name: String,
}

impl From<MbWork> for RawWork {
    fn from(work: MbWork) -> Self {
        let mut raw = Self::new(work.title).with_external_id(work.id);
        if let Some(iswc) = work.iswcs.into_iter().next() {
            raw = raw.with_iswc(iswc);
        }
        raw
    }
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config) -> DiscoveryResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url: config.musicbrainz_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(1),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> DiscoveryResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        let url = url.as_str();
        retry_transient(SOURCE_NAME, move || self.get_once(url, query)).await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> DiscoveryResult<T> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(url)
            .query(query)
            .query(&[("fmt", "json")])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(DiscoveryError::NotFound {
                    entity: url.to_string(),
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                return Err(DiscoveryError::RateLimited {
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            _ => {}
        }

        let response = response
            .error_for_status()
            .map_err(|e| DiscoveryError::http(SOURCE_NAME, e))?;

        response
            .json::<T>()
            .await
            .map_err(|e| DiscoveryError::parse(SOURCE_NAME, e))
    }
}

/// Escape a value for use inside a quoted Lucene phrase.
pub(crate) fn quote_phrase(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl CatalogService for MusicBrainzClient {
    /// Search people and groups whose name matches `query`.
    async fn search_artists(&self, query: &str) -> DiscoveryResult<Vec<CatalogArtist>> {
        let lucene = format!(
            "artist:{} AND (type:person OR type:group)",
            quote_phrase(query)
        );
        let result: MbArtistSearch = self
            .get_json(
                "artist",
                &[("query", lucene), ("limit", ARTIST_SEARCH_LIMIT.to_string())],
            )
            .await?;

        Ok(result
            .artists
            .into_iter()
            .map(|a| CatalogArtist {
                id: a.id,
                name: a.name,
                kind: a.kind,
            })
            .collect())
    }

    async fn browse_works_by_artist(
        &self,
        artist_id: &str,
        offset: usize,
        limit: usize,
    ) -> DiscoveryResult<WorksPage> {
        let result: MbWorkBrowse = self
            .get_json(
                "work",
                &[
                    ("artist", artist_id.to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(WorksPage {
            works: result.works.into_iter().map(RawWork::from).collect(),
            total_count: result.work_count,
        })
    }

    async fn search_works(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> DiscoveryResult<WorksPage> {
        let result: MbWorkSearch = self
            .get_json(
                "work",
                &[
                    ("query", query.to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(WorksPage {
            works: result.works.into_iter().map(RawWork::from).collect(),
            total_count: result.count,
        })
    }

    async fn get_work(&self, work_id: &str) -> DiscoveryResult<WorkDetail> {
        let work: MbWork = self
            .get_json(
                &format!("work/{work_id}"),
                &[("inc", "artist-rels".to_string())],
            )
            .await?;

        Ok(WorkDetail {
            title: work.title,
            iswcs: work.iswcs,
            relations: work
                .relations
                .into_iter()
                .map(|r| WorkRelation {
                    relation_type: r.relation_type,
                    artist_name: r.artist.map(|a| a.name),
                })
                .collect(),
        })
    }

    async fn get_artist(&self, artist_id: &str) -> DiscoveryResult<ArtistDetail> {
        let artist: MbArtistLookup = self
            .get_json(
                &format!("artist/{artist_id}"),
                &[("inc", "url-rels".to_string())],
            )
            .await?;

        Ok(ArtistDetail {
            area: artist.area.map(|a| a.name),
            country: artist.country,
            url_relations: artist
                .relations
                .into_iter()
                .filter_map(|r| {
                    r.url.map(|url| UrlRelation {
                        relation_type: r.relation_type,
                        url: url.resource,
                    })
                })
                .collect(),
        })
    }
}
