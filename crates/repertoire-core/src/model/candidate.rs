use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::attribution::Attribution;
use crate::model::source::SourceTag;

/// A work as returned by one collector, before merging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawWork {
    /// Bibliographic-catalog work identifier, when sourced from the catalog.
    pub external_id: Option<String>,
    pub title: String,
    pub iswc: Option<String>,
    #[serde(default)]
    pub writers: Vec<Attribution>,
    #[serde(default)]
    pub publishers: Vec<Attribution>,
}

impl RawWork {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    /// Set the ISWC; blank values leave the work without one.
    #[must_use]
    pub fn with_iswc(mut self, iswc: impl Into<String>) -> Self {
        self.iswc = clean_iswc(Some(iswc.into()));
        self
    }

    #[must_use]
    pub fn with_writers(mut self, writers: Vec<Attribution>) -> Self {
        self.writers = writers;
        self
    }

    #[must_use]
    pub fn with_publishers(mut self, publishers: Vec<Attribution>) -> Self {
        self.publishers = publishers;
        self
    }
}

/// Trim an ISWC and drop it when nothing is left.
#[must_use]
pub fn clean_iswc(iswc: Option<String>) -> Option<String> {
    iswc.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Attribution payload reported by a single PRO for a candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProDetail {
    pub writers: Vec<Attribution>,
    pub publishers: Vec<Attribution>,
    pub iswc: Option<String>,
}

impl From<&RawWork> for ProDetail {
    fn from(work: &RawWork) -> Self {
        Self {
            writers: work.writers.clone(),
            publishers: work.publishers.clone(),
            iswc: work.iswc.clone(),
        }
    }
}

/// An in-memory, not-yet-persisted musical work during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCandidate {
    /// Deduplication key: `iswc:<ISWC>` or `title:<lowercased title>`.
    pub key: String,
    pub external_id: Option<String>,
    pub title: String,
    pub sources: BTreeSet<SourceTag>,
    pub iswc: Option<String>,
    pub pro_details: BTreeMap<SourceTag, ProDetail>,
}

impl WorkCandidate {
    /// Create a candidate contributed by a single source.
    #[must_use]
    pub fn new(key: impl Into<String>, title: impl Into<String>, source: SourceTag) -> Self {
        Self {
            key: key.into(),
            external_id: None,
            title: title.into(),
            sources: BTreeSet::from([source]),
            iswc: None,
            pro_details: BTreeMap::new(),
        }
    }

    /// Record an ISWC unless one is already known.
    pub fn backfill_iswc(&mut self, iswc: Option<&str>) {
        if self.iswc.is_none() {
            self.iswc = iswc.map(str::to_string);
        }
    }

    /// Number of distinct PROs corroborating this work.
    #[must_use]
    pub fn pro_source_count(&self) -> usize {
        self.sources.iter().filter(|tag| tag.is_pro()).count()
    }

    #[must_use]
    pub fn has_pro_source(&self) -> bool {
        self.pro_source_count() > 0
    }

    #[must_use]
    pub fn has_source(&self, tag: SourceTag) -> bool {
        self.sources.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_iswc_is_dropped() {
        let work = RawWork::new("Blue Sky").with_iswc("   ");
        assert!(work.iswc.is_none());

        let work = RawWork::new("Blue Sky").with_iswc(" T-123 ");
        assert_eq!(work.iswc.as_deref(), Some("T-123"));
    }

    #[test]
    fn test_backfill_never_overwrites() {
        let mut candidate = WorkCandidate::new("title:blue sky", "Blue Sky", SourceTag::Bibliographic);
        candidate.backfill_iswc(None);
        assert!(candidate.iswc.is_none());

        candidate.backfill_iswc(Some("T-1"));
        candidate.backfill_iswc(Some("T-2"));
        candidate.backfill_iswc(None);
        assert_eq!(candidate.iswc.as_deref(), Some("T-1"));
    }

    #[test]
    fn test_pro_source_count_ignores_catalog() {
        let mut candidate = WorkCandidate::new("title:x", "X", SourceTag::Bibliographic);
        assert_eq!(candidate.pro_source_count(), 0);
        candidate.sources.insert(SourceTag::Bmi);
        candidate.sources.insert(SourceTag::Sesac);
        assert_eq!(candidate.pro_source_count(), 2);
        assert!(candidate.has_pro_source());
    }
}
