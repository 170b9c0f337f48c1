//! Collaborator contracts used by the discovery pipeline.
//!
//! Each external system is a trait so the pipeline can be assembled with
//! the real HTTP clients or with in-process doubles. Payloads are narrowed
//! into the typed records below at the client boundary.

use std::fmt;

use async_trait::async_trait;
use repertoire_core::model::{Attribution, RawWork, SourceTag};

use crate::error::DiscoveryResult;

/// An artist returned by a catalog artist search.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
    /// Catalog artist type, e.g. `Person` or `Group`.
    pub kind: Option<String>,
}

/// One page of catalog works.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksPage {
    pub works: Vec<RawWork>,
    /// Total number of works the catalog reports for the query.
    pub total_count: usize,
}

/// A work-to-artist relation from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkRelation {
    /// Relation type, e.g. `composer` or `lyricist`.
    pub relation_type: String,
    pub artist_name: Option<String>,
}

/// Full catalog detail for one work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkDetail {
    pub title: String,
    pub iswcs: Vec<String>,
    pub relations: Vec<WorkRelation>,
}

/// An artist-to-URL relation from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRelation {
    /// Relation type, e.g. `wikidata` or `wikipedia`.
    pub relation_type: String,
    pub url: String,
}

/// Extended catalog detail for one artist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistDetail {
    pub area: Option<String>,
    pub country: Option<String>,
    pub url_relations: Vec<UrlRelation>,
}

/// Attribution data returned by the internal verification agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationResult {
    pub iswc: Option<String>,
    pub writers: Vec<Attribution>,
    pub publishers: Vec<Attribution>,
    pub sources: Vec<String>,
}

/// The bibliographic catalog (MusicBrainz).
#[async_trait]
pub trait CatalogService: Send + Sync + fmt::Debug {
    async fn search_artists(&self, query: &str) -> DiscoveryResult<Vec<CatalogArtist>>;

    async fn browse_works_by_artist(
        &self,
        artist_id: &str,
        offset: usize,
        limit: usize,
    ) -> DiscoveryResult<WorksPage>;

    async fn search_works(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> DiscoveryResult<WorksPage>;

    async fn get_work(&self, work_id: &str) -> DiscoveryResult<WorkDetail>;

    async fn get_artist(&self, artist_id: &str) -> DiscoveryResult<ArtistDetail>;
}

/// Encyclopedia summaries (Wikipedia, reached through Wikidata sitelinks).
#[async_trait]
pub trait EncyclopediaService: Send + Sync + fmt::Debug {
    /// Plain-text summary of the article titled `title`.
    async fn summary(&self, title: &str) -> DiscoveryResult<Option<String>>;

    /// English article title linked from a Wikidata entity.
    async fn title_for_wikidata(&self, qid: &str) -> DiscoveryResult<Option<String>>;
}

/// PRO repertoire extraction, one logical call per organization.
#[async_trait]
pub trait RepertoireService: Send + Sync + fmt::Debug {
    /// Works registered at `pro` for `writer_name`, at most `limit` of them.
    async fn extract_repertoire(
        &self,
        writer_name: &str,
        pro: SourceTag,
        limit: usize,
    ) -> DiscoveryResult<Vec<RawWork>>;
}

/// The internal verification agent, a last-resort attribution source.
#[async_trait]
pub trait VerificationService: Send + Sync + fmt::Debug {
    async fn verify(
        &self,
        work_title: &str,
        writer_name: &str,
    ) -> DiscoveryResult<Option<VerificationResult>>;
}
