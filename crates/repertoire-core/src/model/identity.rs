use serde::{Deserialize, Serialize};

/// Territory reported when the catalog knows nothing about an artist's area.
pub const DEFAULT_TERRITORY: &str = "Worldwide";

/// A songwriter resolved to a bibliographic-catalog artist record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongwriterIdentity {
    /// Catalog artist identifier (a `MusicBrainz` artist MBID).
    pub id: String,
    pub name: String,
    pub primary_territory: String,
    pub wikipedia_summary: Option<String>,
}

impl SongwriterIdentity {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            primary_territory: DEFAULT_TERRITORY.to_string(),
            wikipedia_summary: None,
        }
    }

    #[must_use]
    pub fn with_territory(mut self, territory: impl Into<String>) -> Self {
        self.primary_territory = territory.into();
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.wikipedia_summary = Some(summary.into());
        self
    }

    /// The career overview written onto a completed discovery request.
    #[must_use]
    pub fn career_overview(&self) -> CareerOverview {
        CareerOverview {
            territory: self.primary_territory.clone(),
            biography: self.wikipedia_summary.clone(),
        }
    }
}

/// Territory and biography shown alongside a discovery summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerOverview {
    pub territory: String,
    pub biography: Option<String>,
}

impl Default for CareerOverview {
    fn default() -> Self {
        Self {
            territory: DEFAULT_TERRITORY.to_string(),
            biography: None,
        }
    }
}
