use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

use repertoire_core::model::{DiscoveryRequest, RequestId};

/// A discovery request flowing through the workflow.
///
/// The work item id is the request id; the stage loads the rest of the
/// request from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryJob {
    id: String,
    pub songwriter_name: String,
}

impl DiscoveryJob {
    #[must_use]
    pub fn new(request_id: RequestId, songwriter_name: impl Into<String>) -> Self {
        Self {
            id: request_id.to_string(),
            songwriter_name: songwriter_name.into(),
        }
    }
}

impl From<&DiscoveryRequest> for DiscoveryJob {
    fn from(request: &DiscoveryRequest) -> Self {
        Self::new(request.id, request.songwriter_name.clone())
    }
}

impl WorkItem for DiscoveryJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DiscoveryJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.songwriter_name, self.id)
    }
}
