use serde::{Deserialize, Serialize};
use std::fmt;

/// A source that contributed a candidate work during discovery.
///
/// The derived ordering puts the bibliographic catalog first, followed by
/// the performing-rights organizations in attribution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// The bibliographic catalog (`MusicBrainz`).
    Bibliographic,
    /// American Society of Composers, Authors and Publishers.
    Ascap,
    /// Broadcast Music, Inc.
    Bmi,
    /// SESAC.
    Sesac,
}

impl SourceTag {
    /// The PRO sources in attribution priority order.
    pub const PROS: [Self; 3] = [Self::Ascap, Self::Bmi, Self::Sesac];

    /// Returns `true` for performing-rights organization sources.
    #[must_use]
    pub const fn is_pro(self) -> bool {
        !matches!(self, Self::Bibliographic)
    }

    /// Stable identifier used in JSON payloads and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bibliographic => "bibliographic",
            Self::Ascap => "ascap",
            Self::Bmi => "bmi",
            Self::Sesac => "sesac",
        }
    }

    /// Human-readable organization name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bibliographic => "MusicBrainz",
            Self::Ascap => "ASCAP",
            Self::Bmi => "BMI",
            Self::Sesac => "SESAC",
        }
    }

    /// Public repertoire domain of a PRO; `None` for the catalog.
    #[must_use]
    pub const fn pro_domain(self) -> Option<&'static str> {
        match self {
            Self::Bibliographic => None,
            Self::Ascap => Some("ascap.com"),
            Self::Bmi => Some("bmi.com"),
            Self::Sesac => Some("sesac.com"),
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single collector during candidate collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source returned at least one work.
    Found,
    /// The source answered but had nothing for this writer.
    Empty,
    /// The source could not be reached or its answer could not be parsed.
    Failed,
    /// The source was not consulted.
    Skipped,
}

impl SourceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Empty => "empty",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pro_priority_order() {
        assert_eq!(
            SourceTag::PROS,
            [SourceTag::Ascap, SourceTag::Bmi, SourceTag::Sesac]
        );
        assert!(SourceTag::Ascap < SourceTag::Bmi);
        assert!(SourceTag::Bibliographic < SourceTag::Ascap);
    }

    #[test]
    fn test_is_pro() {
        assert!(!SourceTag::Bibliographic.is_pro());
        assert!(SourceTag::PROS.iter().all(|tag| tag.is_pro()));
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for tag in [
            SourceTag::Bibliographic,
            SourceTag::Ascap,
            SourceTag::Bmi,
            SourceTag::Sesac,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_source_status_display_matches_serde() {
        let json = serde_json::to_string(&SourceStatus::Skipped).unwrap();
        assert_eq!(json, format!("\"{}\"", SourceStatus::Skipped));
    }

    #[test]
    fn test_pro_domains() {
        assert_eq!(SourceTag::Bmi.pro_domain(), Some("bmi.com"));
        assert_eq!(SourceTag::Bibliographic.pro_domain(), None);
    }
}
