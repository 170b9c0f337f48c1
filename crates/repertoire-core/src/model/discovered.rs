use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::ids::{DiscoveredWorkId, RequestId};
use crate::model::source::SourceTag;

/// Completeness score for a work with a resolved ISWC.
pub const COMPLETENESS_WITH_ISWC: f64 = 0.9;

/// Completeness score for a work without an ISWC.
pub const COMPLETENESS_WITHOUT_ISWC: f64 = 0.6;

/// Scores at or above this threshold count as metadata-complete.
pub const METADATA_COMPLETE_THRESHOLD: f64 = 0.7;

/// A data-quality or registration deficiency flagged for follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationGap {
    MissingIswc,
    UnregisteredInPros,
    ConflictingWriters,
    ConflictingSplits,
    ConflictingPublishers,
}

impl RegistrationGap {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingIswc => "missing_iswc",
            Self::UnregisteredInPros => "unregistered_in_pros",
            Self::ConflictingWriters => "conflicting_writers",
            Self::ConflictingSplits => "conflicting_splits",
            Self::ConflictingPublishers => "conflicting_publishers",
        }
    }
}

impl fmt::Display for RegistrationGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether any PRO corroborated a discovered work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Discovered,
    ProVerified,
}

impl VerificationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::ProVerified => "pro_verified",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovered" => Ok(Self::Discovered),
            "pro_verified" => Ok(Self::ProVerified),
            other => Err(Error::InvalidData(format!(
                "unknown verification status: {other}"
            ))),
        }
    }
}

/// Per-PRO registration flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProRegistrations {
    pub ascap: bool,
    pub bmi: bool,
    pub sesac: bool,
}

impl ProRegistrations {
    /// Flags set for every PRO tag present in `sources`.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a SourceTag>) -> Self {
        let mut flags = Self::default();
        for tag in sources {
            match tag {
                SourceTag::Ascap => flags.ascap = true,
                SourceTag::Bmi => flags.bmi = true,
                SourceTag::Sesac => flags.sesac = true,
                SourceTag::Bibliographic => {}
            }
        }
        flags
    }

    #[must_use]
    pub const fn any(&self) -> bool {
        self.ascap || self.bmi || self.sesac
    }
}

/// The normalized, persisted record for one selected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredWorkRow {
    pub id: DiscoveredWorkId,
    pub request_id: RequestId,
    pub user_id: String,
    pub title: String,
    pub iswc: Option<String>,
    pub co_writers: Vec<String>,
    /// Publisher name to ownership share.
    pub publishers: BTreeMap<String, f64>,
    pub pro_registrations: ProRegistrations,
    pub registration_gaps: Vec<RegistrationGap>,
    pub metadata_completeness_score: f64,
    pub verification_status: VerificationStatus,
    /// Raw provenance: merge key, sources, per-PRO payloads.
    pub source_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl DiscoveredWorkRow {
    #[must_use]
    pub fn new(request_id: RequestId, user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: DiscoveredWorkId::new(),
            request_id,
            user_id: user_id.into(),
            title: title.into(),
            iswc: None,
            co_writers: Vec::new(),
            publishers: BTreeMap::new(),
            pro_registrations: ProRegistrations::default(),
            registration_gaps: Vec::new(),
            metadata_completeness_score: COMPLETENESS_WITHOUT_ISWC,
            verification_status: VerificationStatus::Discovered,
            source_data: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn has_gap(&self, gap: RegistrationGap) -> bool {
        self.registration_gaps.contains(&gap)
    }

    #[must_use]
    pub fn is_metadata_complete(&self) -> bool {
        self.metadata_completeness_score >= METADATA_COMPLETE_THRESHOLD
    }

    #[must_use]
    pub fn is_pro_verified(&self) -> bool {
        self.verification_status == VerificationStatus::ProVerified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_wire_names() {
        let json = serde_json::to_string(&vec![
            RegistrationGap::MissingIswc,
            RegistrationGap::ConflictingSplits,
        ])
        .unwrap();
        assert_eq!(json, r#"["missing_iswc","conflicting_splits"]"#);
    }

    #[test]
    fn test_pro_registrations_from_sources() {
        let sources = [SourceTag::Bibliographic, SourceTag::Bmi];
        let flags = ProRegistrations::from_sources(&sources);
        assert!(!flags.ascap);
        assert!(flags.bmi);
        assert!(flags.any());

        let none = ProRegistrations::from_sources(&[SourceTag::Bibliographic]);
        assert!(!none.any());
    }

    #[test]
    fn test_new_row_defaults() {
        let row = DiscoveredWorkRow::new(RequestId::new(), "user-1", "Blue Sky");
        assert!(!row.is_metadata_complete());
        assert!(!row.is_pro_verified());
        assert!(row.registration_gaps.is_empty());
    }

    #[test]
    fn test_verification_status_parse() {
        assert_eq!(
            "pro_verified".parse::<VerificationStatus>().unwrap(),
            VerificationStatus::ProVerified
        );
        assert!("bogus".parse::<VerificationStatus>().is_err());
    }
}
