use serde::{Deserialize, Deserializer, Serialize};

/// A writer or publisher credit with an optional ownership share.
///
/// Shares are percentages in the 0–100 range. They are not required to sum
/// to 100 across a work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_share")]
    pub share: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi: Option<String>,
}

impl Attribution {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            share: None,
            ipi: None,
        }
    }

    #[must_use]
    pub fn with_share(mut self, share: f64) -> Self {
        self.share = Some(share);
        self
    }

    #[must_use]
    pub fn with_ipi(mut self, ipi: impl Into<String>) -> Self {
        self.ipi = Some(ipi.into());
        self
    }

    /// The name used for cross-source comparison: trimmed and lowercased.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Normalize a credited name for case-insensitive comparison.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Accept shares as numbers, numeric strings, or percentages (`"50%"`).
///
/// Extracted repertoire data is loosely typed; anything unparseable is
/// treated as an unknown share rather than a hard error.
fn deserialize_share<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
    .filter(|share: &f64| share.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribution_builder() {
        let credit = Attribution::new("Jane Doe").with_share(50.0).with_ipi("00012345678");
        assert_eq!(credit.share, Some(50.0));
        assert_eq!(credit.ipi.as_deref(), Some("00012345678"));
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(Attribution::new("  Jane DOE ").normalized_name(), "jane doe");
    }

    #[test]
    fn test_share_accepts_numbers_and_percent_strings() {
        let numeric: Attribution = serde_json::from_value(json!({"name": "A", "share": 33.5})).unwrap();
        assert_eq!(numeric.share, Some(33.5));

        let percent: Attribution = serde_json::from_value(json!({"name": "A", "share": "50%"})).unwrap();
        assert_eq!(percent.share, Some(50.0));
    }

    #[test]
    fn test_share_garbage_becomes_none() {
        let credit: Attribution =
            serde_json::from_value(json!({"name": "A", "share": "unknown"})).unwrap();
        assert!(credit.share.is_none());

        let missing: Attribution = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert!(missing.share.is_none());

        let null: Attribution = serde_json::from_value(json!({"name": "A", "share": null})).unwrap();
        assert!(null.share.is_none());
    }
}
