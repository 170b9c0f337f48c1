//! Candidate merge and deduplication.
//!
//! Works are unified by ISWC when a PRO work shares one with an existing
//! candidate, and otherwise by exact case-insensitive title. Near-duplicate
//! titles are never fuzzy-matched.

use std::collections::{BTreeMap, HashMap};

use repertoire_core::model::{normalize_name, ProDetail, RawWork, SourceTag, WorkCandidate};

/// Merge key for a work carrying an ISWC.
///
/// Separators and case are ignored, so `T-034.524.680-1` and
/// `t 0345246801` share a key. The stored ISWC keeps its original form.
pub fn iswc_key(iswc: &str) -> String {
    let canonical: String = iswc
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!("iswc:{canonical}")
}

/// Merge key for a work identified by title alone.
pub fn title_key(title: &str) -> String {
    format!("title:{}", normalize_name(title))
}

/// Insertion-ordered candidates indexed by merge key.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<WorkCandidate>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&WorkCandidate> {
        self.index.get(key).map(|&i| &self.candidates[i])
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut WorkCandidate> {
        self.index.get(key).map(|&i| &mut self.candidates[i])
    }

    fn insert(&mut self, candidate: WorkCandidate) {
        self.index
            .insert(candidate.key.clone(), self.candidates.len());
        self.candidates.push(candidate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkCandidate> {
        self.candidates.iter()
    }

    pub fn into_vec(self) -> Vec<WorkCandidate> {
        self.candidates
    }
}

/// Merge bibliographic works and per-PRO works into one candidate set.
///
/// PROs are visited in priority order regardless of map order.
pub fn merge_candidates(
    bibliographic: &[RawWork],
    pro_works: &BTreeMap<SourceTag, Vec<RawWork>>,
) -> CandidateSet {
    let mut set = CandidateSet::default();

    for work in bibliographic {
        let key = work
            .iswc
            .as_deref()
            .map_or_else(|| title_key(&work.title), iswc_key);

        if let Some(existing) = set.get_mut(&key) {
            existing.sources.insert(SourceTag::Bibliographic);
            existing.backfill_iswc(work.iswc.as_deref());
            if existing.external_id.is_none() {
                existing.external_id.clone_from(&work.external_id);
            }
        } else {
            let mut candidate = WorkCandidate::new(key, work.title.trim(), SourceTag::Bibliographic);
            candidate.iswc.clone_from(&work.iswc);
            candidate.external_id.clone_from(&work.external_id);
            set.insert(candidate);
        }
    }

    for pro in SourceTag::PROS {
        let Some(works) = pro_works.get(&pro) else {
            continue;
        };

        for work in works {
            let key = work
                .iswc
                .as_deref()
                .map(iswc_key)
                .filter(|key| set.contains_key(key))
                .unwrap_or_else(|| title_key(&work.title));

            if let Some(existing) = set.get_mut(&key) {
                existing.sources.insert(pro);
                existing.backfill_iswc(work.iswc.as_deref());
                existing.pro_details.insert(pro, ProDetail::from(work));
            } else {
                let mut candidate = WorkCandidate::new(key, work.title.trim(), pro);
                candidate.iswc.clone_from(&work.iswc);
                candidate.pro_details.insert(pro, ProDetail::from(work));
                set.insert(candidate);
            }
        }
    }

    log::debug!(
        "Merged {} catalog and {} PRO works into {} candidates",
        bibliographic.len(),
        pro_works.values().map(Vec::len).sum::<usize>(),
        set.len()
    );
    set
}
