//! The discovery workflow stage.

use std::path::PathBuf;

use treadle::{Stage, StageContext, StageOutcome};

use repertoire_core::model::{DiscoveryRequest, RequestId, RequestStatus};
use repertoire_core::schema::Database;

use crate::engine::{DiscoveryEngine, DiscoveryTrigger};

fn stage_error(message: impl Into<String>) -> treadle::TreadleError {
    treadle::TreadleError::StageExecution(message.into())
}

/// Runs the discovery engine for the request named by the work item.
///
/// A request that is no longer `processing` is left alone. When discovery
/// fails the request is moved to `failed` with the error message.
#[derive(Debug)]
pub struct DiscoveryStage {
    engine: DiscoveryEngine,
    db_path: PathBuf,
}

impl DiscoveryStage {
    pub fn new(engine: DiscoveryEngine, db_path: PathBuf) -> Self {
        Self { engine, db_path }
    }

    fn load_request(&self, item_id: &str) -> Result<DiscoveryRequest, treadle::TreadleError> {
        let request_id: RequestId = item_id
            .parse()
            .map_err(|e| stage_error(format!("Invalid request ID {item_id}: {e}")))?;

        let db = Database::open(&self.db_path)
            .map_err(|e| stage_error(format!("Failed to open database: {e}")))?;
        db.get_request(&request_id)
            .map_err(|e| stage_error(format!("Failed to load request: {e}")))?
            .ok_or_else(|| stage_error(format!("Discovery request not found: {item_id}")))
    }

    fn mark_failed(&self, request_id: &RequestId, message: &str) {
        let result = Database::open(&self.db_path)
            .and_then(|db| db.mark_request_failed(request_id, message));
        if let Err(e) = result {
            log::error!("Could not mark request {} failed: {}", request_id, e);
        }
    }
}

#[async_trait::async_trait]
impl Stage for DiscoveryStage {
    fn name(&self) -> &str {
        "discover"
    }

    async fn execute(
        &self,
        item: &dyn treadle::WorkItem,
        _ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        // The connection is dropped before any await.
        let request = self.load_request(item.id())?;

        if request.status != RequestStatus::Processing {
            log::info!(
                "Request {} is already {}; nothing to do",
                request.id,
                request.status
            );
            return Ok(StageOutcome::Complete);
        }

        match self.engine.run(&DiscoveryTrigger::from(&request)).await {
            Ok(outcome) => {
                log::info!(
                    "Discovered {} works for {}",
                    outcome.stats.total_found,
                    request.songwriter_name
                );
                Ok(StageOutcome::Complete)
            }
            Err(e) => {
                let message = e.to_string();
                self.mark_failed(&request.id, &message);
                Err(stage_error(format!("Discovery failed: {message}")))
            }
        }
    }
}
