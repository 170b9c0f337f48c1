//! Registration-gap and cross-PRO conflict detection.

use std::collections::{BTreeMap, BTreeSet};

use repertoire_core::model::{Attribution, ProDetail, RegistrationGap, SourceTag, WorkCandidate};

/// Registration gaps for a candidate whose final ISWC is `final_iswc`.
///
/// Conflicts are only checked when at least two PROs reported the work,
/// comparing every pair of them.
pub fn detect_gaps(candidate: &WorkCandidate, final_iswc: Option<&str>) -> Vec<RegistrationGap> {
    let mut gaps = Vec::new();

    if final_iswc.is_none() {
        gaps.push(RegistrationGap::MissingIswc);
    }
    if candidate.has_source(SourceTag::Bibliographic) && !candidate.has_pro_source() {
        gaps.push(RegistrationGap::UnregisteredInPros);
    }

    let details: Vec<&ProDetail> = SourceTag::PROS
        .iter()
        .filter(|pro| candidate.has_source(**pro))
        .filter_map(|pro| candidate.pro_details.get(pro))
        .collect();

    if details.len() >= 2 {
        let pairs = || {
            details
                .iter()
                .enumerate()
                .flat_map(|(i, a)| details[i + 1..].iter().map(move |b| (*a, *b)))
        };

        if pairs().any(|(a, b)| name_set(&a.writers) != name_set(&b.writers)) {
            gaps.push(RegistrationGap::ConflictingWriters);
        }
        if pairs().any(|(a, b)| splits_conflict(&a.writers, &b.writers)) {
            gaps.push(RegistrationGap::ConflictingSplits);
        }
        if pairs().any(|(a, b)| name_set(&a.publishers) != name_set(&b.publishers)) {
            gaps.push(RegistrationGap::ConflictingPublishers);
        }
    }

    gaps
}

fn name_set(credits: &[Attribution]) -> BTreeSet<String> {
    credits
        .iter()
        .map(Attribution::normalized_name)
        .filter(|name| !name.is_empty())
        .collect()
}

fn shares(credits: &[Attribution]) -> BTreeMap<String, f64> {
    credits
        .iter()
        .filter_map(|c| c.share.map(|share| (c.normalized_name(), share)))
        .collect()
}

/// Two sources disagree when both give a share for the same writer and the
/// shares differ.
fn splits_conflict(a: &[Attribution], b: &[Attribution]) -> bool {
    let left = shares(a);
    let right = shares(b);
    left.iter().any(|(name, share)| {
        right
            .get(name)
            .is_some_and(|other| (share - other).abs() > f64::EPSILON)
    })
}
