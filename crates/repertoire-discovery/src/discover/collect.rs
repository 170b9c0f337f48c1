//! Candidate collection from the catalog and the PRO repertoires.
//!
//! Collectors never fail the run. Every outcome is reported as a
//! [`Collected`] value so the caller can keep going with whatever subset of
//! sources answered.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;

use repertoire_core::model::{RawWork, SourceStatus, SourceTag};

use crate::config::MAX_COLLECTION_CAP;
use crate::error::DiscoveryResult;
use crate::musicbrainz::quote_phrase;
use crate::services::{CatalogService, RepertoireService, WorksPage};

/// Works requested per catalog page.
pub const PAGE_SIZE: usize = 100;

/// Outcome of one collector.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected<T> {
    /// The source returned at least one item.
    Found(Vec<T>),
    /// The source answered with nothing.
    Empty,
    /// The source could not be used; the reason is kept for reporting.
    Failed(String),
}

impl<T> Collected<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Found(items)
        }
    }

    pub fn status(&self) -> SourceStatus {
        match self {
            Self::Found(_) => SourceStatus::Found,
            Self::Empty => SourceStatus::Empty,
            Self::Failed(_) => SourceStatus::Failed,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Found(items) => items.len(),
            Self::Empty | Self::Failed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapse to a plain list; failures become empty.
    pub fn into_works(self) -> Vec<T> {
        match self {
            Self::Found(items) => items,
            Self::Empty | Self::Failed(_) => Vec::new(),
        }
    }
}

/// Accumulates catalog works, deduplicated by catalog work id.
#[derive(Debug, Default)]
struct CatalogAccumulator {
    works: Vec<RawWork>,
    seen: HashSet<String>,
}

impl CatalogAccumulator {
    /// Add new works up to `cap`, returning how many were added.
    fn absorb(&mut self, page: Vec<RawWork>, cap: usize) -> usize {
        let before = self.works.len();
        for work in page {
            if self.works.len() >= cap {
                break;
            }
            let is_new = work
                .external_id
                .as_ref()
                .is_none_or(|id| self.seen.insert(id.clone()));
            if is_new {
                self.works.push(work);
            }
        }
        self.works.len() - before
    }
}

/// Page through one catalog listing until `max` items were fetched, the
/// listing is exhausted, or a page adds nothing new.
///
/// Returns `Err` only when the very first page failed.
async fn paginate<F, Fut>(
    acc: &mut CatalogAccumulator,
    cap: usize,
    max: usize,
    label: &str,
    mut fetch: F,
) -> Result<(), String>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = DiscoveryResult<WorksPage>>,
{
    let mut offset = 0;
    while offset < max && acc.works.len() < cap {
        let page = match fetch(offset).await {
            Ok(page) => page,
            Err(e) if offset == 0 => return Err(e.to_string()),
            Err(e) => {
                log::warn!("{} stopped at offset {}: {}", label, offset, e);
                break;
            }
        };

        let fetched = page.works.len();
        if fetched == 0 {
            break;
        }
        let added = acc.absorb(page.works, cap);
        offset += fetched;
        log::debug!("{}: offset {}, {} new works", label, offset, added);

        if added == 0 || offset >= page.total_count {
            break;
        }
    }
    Ok(())
}

/// Browse every work linked to a catalog artist.
///
/// `max` is clamped to `1..=MAX_COLLECTION_CAP`.
pub async fn collect_by_identity(
    catalog: &dyn CatalogService,
    artist_id: &str,
    max: usize,
) -> Collected<RawWork> {
    let max = max.clamp(1, MAX_COLLECTION_CAP);
    let mut acc = CatalogAccumulator::default();

    let outcome = paginate(&mut acc, max, max, "Artist browse", move |offset| {
        catalog.browse_works_by_artist(artist_id, offset, PAGE_SIZE)
    })
    .await;

    match outcome {
        Err(reason) => {
            log::warn!("Artist browse for {} failed: {}", artist_id, reason);
            Collected::Failed(reason)
        }
        Ok(()) => Collected::from_items(acc.works),
    }
}

/// Full-text catalog search fallback, used when the identity browse found
/// nothing.
///
/// Runs the `writer:`, `artistname:` and `artist:` queries in turn, each
/// paginated up to `max`, deduplicating across all three.
pub async fn collect_by_name_search(
    catalog: &dyn CatalogService,
    name: &str,
    max: usize,
) -> Collected<RawWork> {
    let max = max.clamp(1, MAX_COLLECTION_CAP);
    let phrase = quote_phrase(name.trim());
    let queries = [
        format!("writer:{phrase}"),
        format!("artistname:{phrase}"),
        format!("artist:{phrase}"),
    ];

    let mut acc = CatalogAccumulator::default();
    let mut failures = Vec::new();

    for query in &queries {
        let outcome = paginate(&mut acc, usize::MAX, max, query, move |offset| {
            catalog.search_works(query, offset, PAGE_SIZE)
        })
        .await;

        if let Err(reason) = outcome {
            log::warn!("Work search {} failed: {}", query, reason);
            failures.push(reason);
        }
    }

    if failures.len() == queries.len() {
        return Collected::Failed(failures.join("; "));
    }
    Collected::from_items(acc.works)
}

/// Extract one PRO's repertoire for `name`, keeping at most `max * 2` works.
pub async fn collect_from_pro(
    repertoire: &dyn RepertoireService,
    name: &str,
    pro: SourceTag,
    max: usize,
) -> Collected<RawWork> {
    let limit = max.max(1).saturating_mul(2);

    match repertoire.extract_repertoire(name, pro, limit).await {
        Ok(mut works) => {
            works.truncate(limit);
            log::info!("{}: {} works for {}", pro.display_name(), works.len(), name);
            Collected::from_items(works)
        }
        Err(e) => {
            log::warn!("{} extraction for {} failed: {}", pro.display_name(), name, e);
            Collected::Failed(e.to_string())
        }
    }
}

/// Query all three PROs concurrently and join their outcomes.
pub async fn collect_from_all_pros(
    repertoire: &dyn RepertoireService,
    name: &str,
    max: usize,
) -> BTreeMap<SourceTag, Collected<RawWork>> {
    let [first, second, third] = SourceTag::PROS;
    let (a, b, c) = tokio::join!(
        collect_from_pro(repertoire, name, first, max),
        collect_from_pro(repertoire, name, second, max),
        collect_from_pro(repertoire, name, third, max),
    );

    BTreeMap::from([(first, a), (second, b), (third, c)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::DiscoveryError;
    use crate::services::{ArtistDetail, CatalogArtist, WorkDetail};

    #[test]
    fn test_collected_status_and_collapse() {
        let found = Collected::from_items(vec![RawWork::new("Blue Sky")]);
        assert_eq!(found.status(), SourceStatus::Found);
        assert_eq!(found.len(), 1);

        let empty: Collected<RawWork> = Collected::from_items(Vec::new());
        assert_eq!(empty.status(), SourceStatus::Empty);

        let failed: Collected<RawWork> = Collected::Failed("timeout".to_string());
        assert_eq!(failed.status(), SourceStatus::Failed);
        assert!(failed.into_works().is_empty());
    }

    #[test]
    fn test_accumulator_dedups_by_catalog_id() {
        let mut acc = CatalogAccumulator::default();
        let page = vec![
            RawWork::new("A").with_external_id("w1"),
            RawWork::new("A again").with_external_id("w1"),
            RawWork::new("No id"),
            RawWork::new("B").with_external_id("w2"),
        ];
        assert_eq!(acc.absorb(page, 10), 3);
        assert_eq!(acc.absorb(vec![RawWork::new("B").with_external_id("w2")], 10), 0);
    }

    #[test]
    fn test_accumulator_respects_cap() {
        let mut acc = CatalogAccumulator::default();
        let page = (0..5)
            .map(|i| RawWork::new(format!("W{i}")).with_external_id(format!("w{i}")))
            .collect();
        assert_eq!(acc.absorb(page, 3), 3);
        assert_eq!(acc.works.len(), 3);
    }

    /// How the paged catalog answers a browse.
    #[derive(Debug)]
    enum Paging {
        /// Serve `total` distinct works in order.
        Listing { total: usize },
        /// Serve the first page again for every offset.
        Repeating { total: usize },
        /// Serve `total` works but fail from `offset` onwards.
        FailingAt { total: usize, offset: usize },
    }

    #[derive(Debug)]
    struct PagedCatalog {
        paging: Paging,
        fetches: AtomicUsize,
    }

    impl PagedCatalog {
        fn new(paging: Paging) -> Self {
            Self {
                paging,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn page(&self, offset: usize, limit: usize) -> DiscoveryResult<WorksPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let (start, total) = match self.paging {
                Paging::Listing { total } => (offset, total),
                Paging::Repeating { total } => (0, total),
                Paging::FailingAt { offset: failing, .. } if offset >= failing => {
                    return Err(DiscoveryError::http("paged", "503 Service Unavailable"));
                }
                Paging::FailingAt { total, .. } => (offset, total),
            };
            let works = (start..total.min(start + limit))
                .map(|i| RawWork::new(format!("Work {i}")).with_external_id(format!("w{i}")))
                .collect();
            Ok(WorksPage {
                works,
                total_count: total,
            })
        }
    }

    #[async_trait::async_trait]
    impl CatalogService for PagedCatalog {
        async fn search_artists(&self, _query: &str) -> DiscoveryResult<Vec<CatalogArtist>> {
            Ok(Vec::new())
        }

        async fn browse_works_by_artist(
            &self,
            _artist_id: &str,
            offset: usize,
            limit: usize,
        ) -> DiscoveryResult<WorksPage> {
            self.page(offset, limit)
        }

        async fn search_works(
            &self,
            _query: &str,
            offset: usize,
            limit: usize,
        ) -> DiscoveryResult<WorksPage> {
            self.page(offset, limit)
        }

        async fn get_work(&self, _work_id: &str) -> DiscoveryResult<WorkDetail> {
            Ok(WorkDetail::default())
        }

        async fn get_artist(&self, _artist_id: &str) -> DiscoveryResult<ArtistDetail> {
            Ok(ArtistDetail::default())
        }
    }

    #[tokio::test]
    async fn test_browse_stops_at_cap() {
        let catalog = PagedCatalog::new(Paging::Listing { total: 250 });

        let works = collect_by_identity(&catalog, "a1", 200).await.into_works();
        assert_eq!(works.len(), 200);
        assert_eq!(works[199].external_id.as_deref(), Some("w199"));
        assert_eq!(catalog.fetches(), 2);
    }

    #[tokio::test]
    async fn test_browse_stops_at_total_count() {
        let catalog = PagedCatalog::new(Paging::Listing { total: 150 });

        let works = collect_by_identity(&catalog, "a1", 500).await.into_works();
        assert_eq!(works.len(), 150);
        assert_eq!(catalog.fetches(), 2);
    }

    #[tokio::test]
    async fn test_browse_stops_when_page_repeats() {
        let catalog = PagedCatalog::new(Paging::Repeating { total: 1000 });

        let works = collect_by_identity(&catalog, "a1", 1000).await.into_works();
        assert_eq!(works.len(), PAGE_SIZE);
        assert_eq!(catalog.fetches(), 2);
    }

    #[tokio::test]
    async fn test_browse_keeps_pages_before_failure() {
        let catalog = PagedCatalog::new(Paging::FailingAt {
            total: 250,
            offset: 100,
        });

        let collected = collect_by_identity(&catalog, "a1", 250).await;
        assert_eq!(collected.status(), SourceStatus::Found);
        assert_eq!(collected.len(), 100);
        assert_eq!(catalog.fetches(), 2);
    }

    #[tokio::test]
    async fn test_browse_fails_on_first_page() {
        let catalog = PagedCatalog::new(Paging::FailingAt {
            total: 250,
            offset: 0,
        });

        let collected = collect_by_identity(&catalog, "a1", 250).await;
        assert_eq!(collected.status(), SourceStatus::Failed);
        assert_eq!(catalog.fetches(), 1);
    }

    #[tokio::test]
    async fn test_name_search_dedups_across_queries() {
        let catalog = PagedCatalog::new(Paging::Listing { total: 120 });

        let works = collect_by_name_search(&catalog, "Jane Doe", 1000).await.into_works();
        assert_eq!(works.len(), 120);
        // The first query reads both pages; the other two stop after a
        // page that adds nothing new.
        assert_eq!(catalog.fetches(), 4);
    }
}
