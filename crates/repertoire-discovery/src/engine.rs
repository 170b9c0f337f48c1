//! The discovery engine: one request in, persisted rows and a completed
//! request out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use repertoire_core::model::{
    DiscoveredWorkRow, DiscoveryRequest, RawWork, RequestCompletion, RequestId, SongwriterIdentity,
    SourceStatus, SourceTag,
};

use crate::config::Config;
use crate::discover::{
    collect_by_identity, collect_by_name_search, collect_from_all_pros, enrich_all,
    merge_candidates, resolve_identity, select_top, Collected, DiscoveryStats, EnrichmentContext,
};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::musicbrainz::MusicBrainzClient;
use crate::repertoire::LlmRepertoireClient;
use crate::services::{CatalogService, EncyclopediaService, RepertoireService, VerificationService};
use crate::store::{DiscoveryStore, SqliteStore};
use crate::verification::VerificationAgentClient;
use crate::wikipedia::WikipediaClient;

/// Source-report key for the catalog artist browse.
pub const CATALOG_BROWSE: &str = "catalog_browse";
/// Source-report key for the catalog full-text search fallback.
pub const CATALOG_SEARCH: &str = "catalog_search";

/// The collaborators a discovery run talks to.
#[derive(Debug, Clone)]
pub struct DiscoveryServices {
    pub catalog: Arc<dyn CatalogService>,
    pub encyclopedia: Arc<dyn EncyclopediaService>,
    pub repertoire: Arc<dyn RepertoireService>,
    /// Last-resort attribution source; skipped when `None`.
    pub verifier: Option<Arc<dyn VerificationService>>,
    pub store: Arc<dyn DiscoveryStore>,
}

/// Tuning knobs for a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub default_max_songs: u32,
    pub collection_cap: usize,
    pub enrichment_delay: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DiscoverySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_max_songs: config.default_max_songs,
            collection_cap: config.effective_collection_cap(),
            enrichment_delay: config.enrichment_delay(),
        }
    }
}

/// The invocation payload of a discovery run.
///
/// Every field is optional on the wire so missing ones can be reported as
/// a failed response rather than a deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryTrigger {
    pub request_id: Option<String>,
    pub songwriter_name: Option<String>,
    pub user_id: Option<String>,
    pub max_songs: Option<u32>,
}

impl From<&DiscoveryRequest> for DiscoveryTrigger {
    fn from(request: &DiscoveryRequest) -> Self {
        Self {
            request_id: Some(request.id.to_string()),
            songwriter_name: Some(request.songwriter_name.clone()),
            user_id: Some(request.user_id.clone()),
            max_songs: request.max_songs,
        }
    }
}

/// The response of a discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub success: bool,
    pub discovered: u32,
    pub meta_complete: u32,
    pub verification_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscoveryResponse {
    fn failure(error: &DiscoveryError) -> Self {
        Self {
            success: false,
            discovered: 0,
            meta_complete: 0,
            verification_rate: 0,
            error: Some(error.to_string()),
        }
    }
}

impl From<&DiscoveryOutcome> for DiscoveryResponse {
    fn from(outcome: &DiscoveryOutcome) -> Self {
        Self {
            success: true,
            discovered: outcome.stats.total_found,
            meta_complete: outcome.stats.metadata_complete_count,
            verification_rate: outcome.stats.verification_rate,
            error: None,
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub request_id: RequestId,
    pub identity: Option<SongwriterIdentity>,
    pub rows: Vec<DiscoveredWorkRow>,
    pub stats: DiscoveryStats,
    pub summary: String,
    pub source_report: BTreeMap<String, SourceStatus>,
}

/// A validated trigger.
#[derive(Debug)]
struct Job<'a> {
    request_id: RequestId,
    songwriter_name: &'a str,
    user_id: &'a str,
    limit: usize,
}

/// Runs the five discovery stages and persists the result.
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    services: DiscoveryServices,
    settings: DiscoverySettings,
}

impl DiscoveryEngine {
    pub fn new(services: DiscoveryServices, settings: DiscoverySettings) -> Self {
        Self { services, settings }
    }

    /// Build an engine with the HTTP clients and SQLite store described by
    /// `config`.
    ///
    /// # Errors
    /// Returns an error if any HTTP client cannot be created.
    pub fn from_config(config: &Config) -> DiscoveryResult<Self> {
        let verifier = VerificationAgentClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn VerificationService>);

        let services = DiscoveryServices {
            catalog: Arc::new(MusicBrainzClient::new(config)?),
            encyclopedia: Arc::new(WikipediaClient::new(config)?),
            repertoire: Arc::new(LlmRepertoireClient::new(config)?),
            verifier,
            store: Arc::new(SqliteStore::new(config.database_path.clone())),
        };

        Ok(Self::new(services, DiscoverySettings::from_config(config)))
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Run discovery and report the outcome as a response payload.
    ///
    /// Failures are logged and turned into an unsuccessful response.
    pub async fn handle(&self, trigger: &DiscoveryTrigger) -> DiscoveryResponse {
        match self.run(trigger).await {
            Ok(outcome) => DiscoveryResponse::from(&outcome),
            Err(e) => {
                log::error!("Discovery failed: {}", e);
                DiscoveryResponse::failure(&e)
            }
        }
    }

    /// Run discovery for one request.
    ///
    /// Source failures only reduce what is found. Missing trigger fields
    /// and store failures are errors, and the request is then left
    /// unfinished.
    pub async fn run(&self, trigger: &DiscoveryTrigger) -> DiscoveryResult<DiscoveryOutcome> {
        let job = self.validate(trigger)?;
        let name = job.songwriter_name;
        log::info!(
            "Starting discovery {} for {:?} (up to {} works)",
            job.request_id,
            name,
            job.limit
        );

        let identity = resolve_identity(
            self.services.catalog.as_ref(),
            self.services.encyclopedia.as_ref(),
            name,
        )
        .await;

        let ((catalog_works, mut source_report), pro_results) = tokio::join!(
            self.collect_catalog(identity.as_ref(), name),
            collect_from_all_pros(self.services.repertoire.as_ref(), name, job.limit),
        );

        let mut pro_works: BTreeMap<SourceTag, Vec<RawWork>> = BTreeMap::new();
        for (pro, collected) in pro_results {
            source_report.insert(pro.as_str().to_string(), collected.status());
            pro_works.insert(pro, collected.into_works());
        }

        let candidates = merge_candidates(&catalog_works, &pro_works);
        let merged = candidates.len();
        let selected = select_top(candidates.into_vec(), job.limit);
        log::info!("Selected {} of {} candidates", selected.len(), merged);

        let ctx = EnrichmentContext {
            catalog: self.services.catalog.as_ref(),
            verifier: self.services.verifier.as_deref(),
            request_id: job.request_id,
            user_id: job.user_id,
            songwriter_name: name,
        };
        let rows = enrich_all(&selected, &ctx, self.settings.enrichment_delay).await;

        self.services.store.insert_discovered_works(&rows)?;

        let stats = DiscoveryStats::from_rows(&rows);
        let summary = stats.summary(name);
        let career_overview = identity
            .as_ref()
            .map(SongwriterIdentity::career_overview)
            .unwrap_or_default();

        self.services.store.complete_request(&RequestCompletion {
            request_id: job.request_id,
            total_found: stats.total_found,
            metadata_complete_count: stats.metadata_complete_count,
            summary: summary.clone(),
            career_overview,
            source_report: source_report.clone(),
        })?;

        log::info!("Discovery {} completed: {}", job.request_id, summary);
        Ok(DiscoveryOutcome {
            request_id: job.request_id,
            identity,
            rows,
            stats,
            summary,
            source_report,
        })
    }

    fn validate<'a>(&self, trigger: &'a DiscoveryTrigger) -> DiscoveryResult<Job<'a>> {
        let request_id = required(trigger.request_id.as_deref(), "requestId")?.parse()?;
        let songwriter_name = required(trigger.songwriter_name.as_deref(), "songwriterName")?;
        let user_id = required(trigger.user_id.as_deref(), "userId")?;
        let limit = trigger
            .max_songs
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.default_max_songs) as usize;

        Ok(Job {
            request_id,
            songwriter_name,
            user_id,
            limit,
        })
    }

    /// Identity browse, falling back to name search when it finds nothing.
    async fn collect_catalog(
        &self,
        identity: Option<&SongwriterIdentity>,
        name: &str,
    ) -> (Vec<RawWork>, BTreeMap<String, SourceStatus>) {
        let catalog = self.services.catalog.as_ref();
        let cap = self.settings.collection_cap;
        let mut report = BTreeMap::new();

        let browsed = match identity {
            Some(identity) => collect_by_identity(catalog, &identity.id, cap).await,
            None => Collected::Empty,
        };
        report.insert(
            CATALOG_BROWSE.to_string(),
            if identity.is_some() {
                browsed.status()
            } else {
                SourceStatus::Skipped
            },
        );

        if !browsed.is_empty() {
            report.insert(CATALOG_SEARCH.to_string(), SourceStatus::Skipped);
            return (browsed.into_works(), report);
        }

        log::info!("No works from artist browse; searching catalog by name");
        let searched = collect_by_name_search(catalog, name, cap).await;
        report.insert(CATALOG_SEARCH.to_string(), searched.status());
        (searched.into_works(), report)
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> DiscoveryResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(DiscoveryError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_uses_camel_case() {
        let trigger: DiscoveryTrigger = serde_json::from_str(
            r#"{"requestId": "r", "songwriterName": "Jane Doe", "userId": "u", "maxSongs": 5}"#,
        )
        .unwrap();
        assert_eq!(trigger.songwriter_name.as_deref(), Some("Jane Doe"));
        assert_eq!(trigger.max_songs, Some(5));
    }

    #[test]
    fn test_response_serialization() {
        let response = DiscoveryResponse {
            success: true,
            discovered: 3,
            meta_complete: 2,
            verification_rate: 33,
            error: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["metaComplete"], 2);
        assert_eq!(json["verificationRate"], 33);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(Some("  "), "userId").is_err());
        assert!(required(None, "userId").is_err());
        assert_eq!(required(Some(" u1 "), "userId").unwrap(), "u1");
    }

    #[test]
    fn test_trigger_from_request() {
        let request = DiscoveryRequest::new("Jane Doe", "user-1").with_max_songs(10);
        let trigger = DiscoveryTrigger::from(&request);
        assert_eq!(trigger.request_id, Some(request.id.to_string()));
        assert_eq!(trigger.max_songs, Some(10));
    }
}
