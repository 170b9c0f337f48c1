//! Per-candidate enrichment into persisted rows.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde_json::json;

use repertoire_core::model::{
    normalize_name, Attribution, DiscoveredWorkRow, ProDetail, ProRegistrations, RequestId,
    SourceTag, VerificationStatus, WorkCandidate, COMPLETENESS_WITHOUT_ISWC,
    COMPLETENESS_WITH_ISWC,
};

use crate::discover::gaps::detect_gaps;
use crate::resilience::Throttle;
use crate::services::{CatalogService, VerificationResult, VerificationService, WorkDetail};

/// Catalog relation types that credit a writer.
const WRITER_RELATIONS: [&str; 4] = ["writer", "composer", "lyricist", "author"];

/// Collaborators and request fields needed to enrich candidates.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentContext<'a> {
    pub catalog: &'a dyn CatalogService,
    pub verifier: Option<&'a dyn VerificationService>,
    pub request_id: RequestId,
    pub user_id: &'a str,
    pub songwriter_name: &'a str,
}

/// What the catalog's work detail contributes.
#[derive(Debug, Default)]
struct CatalogFacts {
    title: Option<String>,
    iswc: Option<String>,
    writers: Vec<String>,
}

impl From<WorkDetail> for CatalogFacts {
    fn from(detail: WorkDetail) -> Self {
        let title = Some(detail.title.trim().to_string()).filter(|t| !t.is_empty());
        let iswc = detail
            .iswcs
            .iter()
            .map(|i| i.trim())
            .find(|i| !i.is_empty())
            .map(str::to_string);
        let writers = detail
            .relations
            .into_iter()
            .filter(|r| {
                WRITER_RELATIONS
                    .iter()
                    .any(|kind| r.relation_type.eq_ignore_ascii_case(kind))
            })
            .filter_map(|r| r.artist_name)
            .collect();

        Self {
            title,
            iswc,
            writers,
        }
    }
}

async fn catalog_facts(ctx: &EnrichmentContext<'_>, candidate: &WorkCandidate) -> CatalogFacts {
    let Some(work_id) = candidate.external_id.as_deref() else {
        return CatalogFacts::default();
    };

    match ctx.catalog.get_work(work_id).await {
        Ok(detail) => CatalogFacts::from(detail),
        Err(e) => {
            log::debug!("Work detail for {} unavailable: {}", work_id, e);
            CatalogFacts::default()
        }
    }
}

async fn verify(ctx: &EnrichmentContext<'_>, title: &str) -> Option<VerificationResult> {
    let verifier = ctx.verifier?;
    match verifier.verify(title, ctx.songwriter_name).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Verification lookup for {:?} failed: {}", title, e);
            None
        }
    }
}

/// Names in order of first appearance, deduplicated case-insensitively.
fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty() && seen.insert(normalize_name(name)))
        .map(str::to_string)
        .collect()
}

fn publisher_shares(publishers: &[Attribution]) -> BTreeMap<String, f64> {
    let mut shares = BTreeMap::new();
    for publisher in publishers {
        let name = publisher.name.trim();
        if !name.is_empty() {
            shares
                .entry(name.to_string())
                .or_insert(publisher.share.unwrap_or(0.0));
        }
    }
    shares
}

/// Build the persisted row for one selected candidate.
///
/// Attribution comes from the highest-priority PRO that reported the work,
/// then the catalog, then the verification agent, which is only consulted
/// when no PRO reported the work.
pub async fn enrich_candidate(
    candidate: &WorkCandidate,
    ctx: &EnrichmentContext<'_>,
) -> DiscoveredWorkRow {
    let facts = catalog_facts(ctx, candidate).await;
    let title = facts
        .title
        .clone()
        .unwrap_or_else(|| candidate.title.clone());

    let chosen: Option<(SourceTag, &ProDetail)> = SourceTag::PROS
        .into_iter()
        .find_map(|pro| candidate.pro_details.get(&pro).map(|d| (pro, d)));

    let verification = match chosen {
        Some(_) => None,
        None => verify(ctx, &title).await,
    };

    let mut co_writers = chosen
        .map(|(_, detail)| unique_names(detail.writers.iter().map(|w| w.name.as_str())))
        .unwrap_or_default();
    if co_writers.is_empty() {
        co_writers = unique_names(facts.writers.iter().map(String::as_str));
    }
    if co_writers.is_empty() {
        if let Some(v) = &verification {
            co_writers = unique_names(v.writers.iter().map(|w| w.name.as_str()));
        }
    }

    let publishers = match (chosen, &verification) {
        (Some((_, detail)), _) => publisher_shares(&detail.publishers),
        (None, Some(v)) => publisher_shares(&v.publishers),
        (None, None) => BTreeMap::new(),
    };

    let final_iswc = facts
        .iswc
        .clone()
        .or_else(|| {
            SourceTag::PROS
                .iter()
                .filter_map(|pro| candidate.pro_details.get(pro))
                .find_map(|detail| detail.iswc.clone())
        })
        .or_else(|| candidate.iswc.clone())
        .or_else(|| verification.as_ref().and_then(|v| v.iswc.clone()));

    let pro_registrations = ProRegistrations::from_sources(&candidate.sources);

    let mut row = DiscoveredWorkRow::new(ctx.request_id, ctx.user_id, title);
    row.registration_gaps = detect_gaps(candidate, final_iswc.as_deref());
    row.metadata_completeness_score = if final_iswc.is_some() {
        COMPLETENESS_WITH_ISWC
    } else {
        COMPLETENESS_WITHOUT_ISWC
    };
    row.verification_status = if pro_registrations.any() {
        VerificationStatus::ProVerified
    } else {
        VerificationStatus::Discovered
    };
    row.source_data = json!({
        "merge_key": candidate.key,
        "sources": candidate.sources,
        "external_id": candidate.external_id,
        "chosen_pro": chosen.map(|(pro, _)| pro),
        "catalog_writers": facts.writers,
        "verification_consulted": chosen.is_none() && ctx.verifier.is_some(),
        "verification_sources": verification.as_ref().map(|v| v.sources.clone()),
        "pro_details": candidate.pro_details,
    });
    row.iswc = final_iswc;
    row.co_writers = co_writers;
    row.publishers = publishers;
    row.pro_registrations = pro_registrations;
    row
}

/// Enrich candidates one at a time, pausing `delay` between consecutive
/// candidates.
pub async fn enrich_all(
    candidates: &[WorkCandidate],
    ctx: &EnrichmentContext<'_>,
    delay: Duration,
) -> Vec<DiscoveredWorkRow> {
    let mut throttle = Throttle::new(delay);
    let mut rows = Vec::with_capacity(candidates.len());

    for (i, candidate) in candidates.iter().enumerate() {
        throttle.tick().await;
        log::debug!("Enriching {}/{}: {}", i + 1, candidates.len(), candidate.title);
        rows.push(enrich_candidate(candidate, ctx).await);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::WorkRelation;

    #[test]
    fn test_unique_names_case_insensitive() {
        let names = unique_names(["Jane Doe", " jane doe", "John Roe", ""]);
        assert_eq!(names, ["Jane Doe", "John Roe"]);
    }

    #[test]
    fn test_publisher_shares_default_to_zero() {
        let shares = publisher_shares(&[
            Attribution::new("Doe Songs").with_share(60.0),
            Attribution::new("Roe Music"),
        ]);
        assert_eq!(shares.get("Doe Songs"), Some(&60.0));
        assert_eq!(shares.get("Roe Music"), Some(&0.0));
    }

    #[test]
    fn test_catalog_facts_from_detail() {
        let detail = WorkDetail {
            title: " Blue Sky ".to_string(),
            iswcs: vec![String::new(), "T-123".to_string()],
            relations: vec![
                WorkRelation {
                    relation_type: "Composer".to_string(),
                    artist_name: Some("Jane Doe".to_string()),
                },
                WorkRelation {
                    relation_type: "arranger".to_string(),
                    artist_name: Some("Arranger Person".to_string()),
                },
                WorkRelation {
                    relation_type: "lyricist".to_string(),
                    artist_name: None,
                },
            ],
        };

        let facts = CatalogFacts::from(detail);
        assert_eq!(facts.title.as_deref(), Some("Blue Sky"));
        assert_eq!(facts.iswc.as_deref(), Some("T-123"));
        assert_eq!(facts.writers, ["Jane Doe"]);
    }
}
