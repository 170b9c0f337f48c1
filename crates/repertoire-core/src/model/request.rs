use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::identity::CareerOverview;
use crate::model::ids::RequestId;
use crate::model::source::SourceStatus;

/// Lifecycle state of a discovery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Processing,
    Completed,
    Failed,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidData(format!("unknown request status: {other}"))),
        }
    }
}

/// The persistent job record a discovery run reads and updates.
///
/// Created by the caller in the `processing` state. The discovery engine
/// only writes results and moves the status to `completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub id: RequestId,
    pub songwriter_name: String,
    pub user_id: String,
    pub max_songs: Option<u32>,
    pub status: RequestStatus,
    pub total_found: u32,
    pub metadata_complete_count: u32,
    pub summary: Option<String>,
    pub career_overview: Option<CareerOverview>,
    /// Outcome of each collector, keyed by collector name.
    pub source_report: BTreeMap<String, SourceStatus>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscoveryRequest {
    #[must_use]
    pub fn new(songwriter_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            songwriter_name: songwriter_name.into(),
            user_id: user_id.into(),
            max_songs: None,
            status: RequestStatus::Processing,
            total_found: 0,
            metadata_complete_count: 0,
            summary: None,
            career_overview: None,
            source_report: BTreeMap::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_max_songs(mut self, max_songs: u32) -> Self {
        self.max_songs = Some(max_songs);
        self
    }
}

/// Results written onto a request when discovery completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCompletion {
    pub request_id: RequestId,
    pub total_found: u32,
    pub metadata_complete_count: u32,
    pub summary: String,
    pub career_overview: CareerOverview,
    pub source_report: BTreeMap<String, SourceStatus>,
}
