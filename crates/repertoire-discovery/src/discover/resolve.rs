//! Entity resolution: songwriter name to catalog identity.

use std::borrow::Cow;

use reqwest::Url;
use repertoire_core::model::{normalize_name, SongwriterIdentity};

use crate::services::{ArtistDetail, CatalogArtist, CatalogService, EncyclopediaService};

/// Artist types that can be credited as songwriters.
const WRITER_KINDS: [&str; 2] = ["person", "group"];

/// Resolve `name` to a catalog identity.
///
/// Prefers a case-insensitive exact name match and otherwise takes the
/// first (most relevant) result. Returns `None` when the search fails or
/// finds nothing. Territory and biography are best effort: any failure
/// leaves the defaults in place.
pub async fn resolve_identity(
    catalog: &dyn CatalogService,
    encyclopedia: &dyn EncyclopediaService,
    name: &str,
) -> Option<SongwriterIdentity> {
    let artists = match catalog.search_artists(name).await {
        Ok(artists) => artists,
        Err(e) => {
            log::warn!("Artist search for {:?} failed: {}", name, e);
            return None;
        }
    };

    let candidates: Vec<CatalogArtist> = artists
        .into_iter()
        .filter(|artist| {
            artist
                .kind
                .as_deref()
                .is_some_and(|kind| WRITER_KINDS.contains(&kind.to_lowercase().as_str()))
        })
        .collect();

    let wanted = normalize_name(name);
    let chosen = candidates
        .iter()
        .find(|artist| normalize_name(&artist.name) == wanted)
        .or_else(|| candidates.first())?;

    log::info!("Resolved {:?} to catalog artist {} ({})", name, chosen.name, chosen.id);
    let mut identity = SongwriterIdentity::new(chosen.id.clone(), chosen.name.clone());

    let detail = match catalog.get_artist(&chosen.id).await {
        Ok(detail) => detail,
        Err(e) => {
            log::debug!("Artist detail for {} unavailable: {}", chosen.id, e);
            return Some(identity);
        }
    };

    if let Some(territory) = territory(&detail) {
        identity = identity.with_territory(territory);
    }
    if let Some(summary) = biography(encyclopedia, &detail).await {
        identity = identity.with_summary(summary);
    }

    Some(identity)
}

/// Area name, falling back to the country code.
fn territory(detail: &ArtistDetail) -> Option<&str> {
    detail
        .area
        .as_deref()
        .or(detail.country.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Summary text for the artist's encyclopedia article, via a direct
/// `wikipedia` link or a `wikidata` sitelink.
async fn biography(encyclopedia: &dyn EncyclopediaService, detail: &ArtistDetail) -> Option<String> {
    let title = article_title(encyclopedia, detail).await?;

    match encyclopedia.summary(&title).await {
        Ok(summary) => summary,
        Err(e) => {
            log::debug!("Encyclopedia summary for {:?} unavailable: {}", title, e);
            None
        }
    }
}

async fn article_title(
    encyclopedia: &dyn EncyclopediaService,
    detail: &ArtistDetail,
) -> Option<String> {
    let relation_url = |kind: &str| {
        detail
            .url_relations
            .iter()
            .find(|r| r.relation_type.eq_ignore_ascii_case(kind))
            .and_then(|r| last_path_segment(&r.url))
    };

    if let Some(title) = relation_url("wikipedia") {
        return Some(title.replace('_', " "));
    }

    let qid = relation_url("wikidata")?;
    match encyclopedia.title_for_wikidata(&qid).await {
        Ok(title) => title,
        Err(e) => {
            log::debug!("Wikidata sitelink lookup for {} failed: {}", qid, e);
            None
        }
    }
}

/// Last non-empty path segment of a URL, percent-decoded.
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), Cow::into_owned);
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryResult;
    use crate::services::{WorkDetail, WorksPage};

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("https://www.wikidata.org/wiki/Q42").as_deref(),
            Some("Q42")
        );
        assert_eq!(
            last_path_segment("https://en.wikipedia.org/wiki/Jane_Doe_(songwriter)/").as_deref(),
            Some("Jane_Doe_(songwriter)")
        );
        assert_eq!(
            last_path_segment("https://en.wikipedia.org/wiki/Beyonc%C3%A9?oldid=1").as_deref(),
            Some("Beyoncé")
        );
        assert_eq!(
            last_path_segment("https://en.wikipedia.org/wiki/100%25_Pure").as_deref(),
            Some("100%_Pure")
        );
        assert!(last_path_segment("https://en.wikipedia.org/").is_none());
        assert!(last_path_segment("not a url").is_none());
        assert!(last_path_segment("").is_none());
    }

    #[derive(Debug)]
    struct ArtistsOnly(Vec<CatalogArtist>);

    #[async_trait::async_trait]
    impl CatalogService for ArtistsOnly {
        async fn search_artists(&self, _query: &str) -> DiscoveryResult<Vec<CatalogArtist>> {
            Ok(self.0.clone())
        }

        async fn browse_works_by_artist(
            &self,
            _artist_id: &str,
            _offset: usize,
            _limit: usize,
        ) -> DiscoveryResult<WorksPage> {
            Ok(WorksPage::default())
        }

        async fn search_works(
            &self,
            _query: &str,
            _offset: usize,
            _limit: usize,
        ) -> DiscoveryResult<WorksPage> {
            Ok(WorksPage::default())
        }

        async fn get_work(&self, _work_id: &str) -> DiscoveryResult<WorkDetail> {
            Ok(WorkDetail::default())
        }

        async fn get_artist(&self, _artist_id: &str) -> DiscoveryResult<ArtistDetail> {
            Ok(ArtistDetail::default())
        }
    }

    #[derive(Debug)]
    struct NoEncyclopedia;

    #[async_trait::async_trait]
    impl EncyclopediaService for NoEncyclopedia {
        async fn summary(&self, _title: &str) -> DiscoveryResult<Option<String>> {
            Ok(None)
        }

        async fn title_for_wikidata(&self, _qid: &str) -> DiscoveryResult<Option<String>> {
            Ok(None)
        }
    }

    fn artist(id: &str, name: &str, kind: Option<&str>) -> CatalogArtist {
        CatalogArtist {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_untyped_and_non_writer_artists_are_skipped() {
        let catalog = ArtistsOnly(vec![
            artist("a0", "Jane Doe", None),
            artist("a1", "Jane Doe", Some("Character")),
            artist("a2", "Jane Doe & Friends", Some("Group")),
        ]);

        let identity = resolve_identity(&catalog, &NoEncyclopedia, "Jane Doe").await.unwrap();
        assert_eq!(identity.id, "a2");
        assert_eq!(identity.primary_territory, "Worldwide");
    }

    #[tokio::test]
    async fn test_no_typed_artist_resolves_to_none() {
        let catalog = ArtistsOnly(vec![artist("a0", "Jane Doe", None)]);
        assert!(resolve_identity(&catalog, &NoEncyclopedia, "Jane Doe").await.is_none());
    }

    #[test]
    fn test_territory_prefers_area() {
        let detail = ArtistDetail {
            area: Some("United Kingdom".to_string()),
            country: Some("GB".to_string()),
            url_relations: Vec::new(),
        };
        assert_eq!(territory(&detail), Some("United Kingdom"));

        let detail = ArtistDetail {
            area: None,
            country: Some("GB".to_string()),
            url_relations: Vec::new(),
        };
        assert_eq!(territory(&detail), Some("GB"));
        assert_eq!(territory(&ArtistDetail::default()), None);
    }
}
