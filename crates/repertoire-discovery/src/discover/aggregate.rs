//! Aggregate statistics and the request summary.

use std::fmt;

use repertoire_core::model::DiscoveredWorkRow;

/// Qualitative description of how many works a PRO corroborated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStrength {
    Strong,
    Moderate,
    Modest,
}

impl VerificationStrength {
    /// `Strong` from 50 %, `Moderate` from 20 %, otherwise `Modest`.
    pub const fn from_rate(rate: u32) -> Self {
        match rate {
            50.. => Self::Strong,
            20..=49 => Self::Moderate,
            _ => Self::Modest,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Modest => "modest",
        }
    }
}

impl fmt::Display for VerificationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts over the rows of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscoveryStats {
    pub total_found: u32,
    pub metadata_complete_count: u32,
    pub iswc_count: u32,
    pub pro_verified_count: u32,
    /// Percentage of works corroborated by a PRO, rounded.
    pub verification_rate: u32,
}

impl DiscoveryStats {
    pub fn from_rows(rows: &[DiscoveredWorkRow]) -> Self {
        let count = |pred: fn(&DiscoveredWorkRow) -> bool| rows.iter().filter(|r| pred(r)).count() as u32;

        let total_found = rows.len() as u32;
        let pro_verified_count = count(DiscoveredWorkRow::is_pro_verified);
        let verification_rate = if total_found == 0 {
            0
        } else {
            (f64::from(pro_verified_count) / f64::from(total_found) * 100.0).round() as u32
        };

        Self {
            total_found,
            metadata_complete_count: count(DiscoveredWorkRow::is_metadata_complete),
            iswc_count: count(|r| r.iswc.is_some()),
            pro_verified_count,
            verification_rate,
        }
    }

    pub const fn strength(&self) -> VerificationStrength {
        VerificationStrength::from_rate(self.verification_rate)
    }

    /// Human-readable summary written onto the request.
    pub fn summary(&self, songwriter_name: &str) -> String {
        if self.total_found == 0 {
            return format!(
                "No works were discovered for {}. No catalog or PRO source returned matching \
                 works.",
                songwriter_name
            );
        }

        format!(
            "Discovered {} works for {}: {} with complete metadata, {} with an ISWC, and {} \
             verified by at least one PRO ({}% verification rate, a {} result).",
            self.total_found,
            songwriter_name,
            self.metadata_complete_count,
            self.iswc_count,
            self.pro_verified_count,
            self.verification_rate,
            self.strength()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire_core::model::{
        RequestId, VerificationStatus, COMPLETENESS_WITH_ISWC,
    };

    fn row(iswc: bool, verified: bool) -> DiscoveredWorkRow {
        let mut row = DiscoveredWorkRow::new(RequestId::new(), "user-1", "Work");
        if iswc {
            row.iswc = Some("T-1".to_string());
            row.metadata_completeness_score = COMPLETENESS_WITH_ISWC;
        }
        if verified {
            row.verification_status = VerificationStatus::ProVerified;
        }
        row
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(VerificationStrength::from_rate(100), VerificationStrength::Strong);
        assert_eq!(VerificationStrength::from_rate(50), VerificationStrength::Strong);
        assert_eq!(VerificationStrength::from_rate(49), VerificationStrength::Moderate);
        assert_eq!(VerificationStrength::from_rate(20), VerificationStrength::Moderate);
        assert_eq!(VerificationStrength::from_rate(19), VerificationStrength::Modest);
        assert_eq!(VerificationStrength::from_rate(0), VerificationStrength::Modest);
    }

    #[test]
    fn test_empty_run() {
        let stats = DiscoveryStats::from_rows(&[]);
        assert_eq!(stats, DiscoveryStats::default());
        assert!(stats.summary("Jane Doe").contains("No works"));
    }

    #[test]
    fn test_counts_and_rounding() {
        let rows = vec![row(true, true), row(false, false), row(true, false)];
        let stats = DiscoveryStats::from_rows(&rows);

        assert_eq!(stats.total_found, 3);
        assert_eq!(stats.metadata_complete_count, 2);
        assert_eq!(stats.iswc_count, 2);
        assert_eq!(stats.pro_verified_count, 1);
        assert_eq!(stats.verification_rate, 33);
        assert_eq!(stats.strength(), VerificationStrength::Moderate);

        let summary = stats.summary("Jane Doe");
        assert!(summary.contains("Discovered 3 works for Jane Doe"));
        assert!(summary.contains("33% verification rate"));
        assert!(summary.contains("moderate"));
    }

    #[test]
    fn test_two_thirds_rounds_up() {
        let rows = vec![row(false, true), row(false, true), row(false, false)];
        assert_eq!(DiscoveryStats::from_rows(&rows).verification_rate, 67);
    }
}
