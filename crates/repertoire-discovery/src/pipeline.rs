use std::path::PathBuf;
use treadle::Workflow;

use crate::engine::DiscoveryEngine;
use crate::stage::DiscoveryStage;

/// Build the single-stage discovery workflow.
///
/// # Errors
/// Returns an error if the workflow cannot be built.
pub fn build_discovery_workflow(
    engine: DiscoveryEngine,
    db_path: PathBuf,
) -> treadle::Result<Workflow> {
    Workflow::builder()
        .stage("discover", DiscoveryStage::new(engine, db_path))
        .build()
}
