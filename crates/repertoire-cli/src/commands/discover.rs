use anyhow::{Context, Result};
use std::path::Path;

use repertoire_core::model::{DiscoveryRequest, RequestStatus};
use repertoire_core::schema::Database;
use repertoire_discovery::{build_discovery_workflow, Config, DiscoveryEngine, DiscoveryJob};

use super::status::print_request;

/// Create a discovery request and run it through the discovery workflow.
pub async fn run_discover(
    config: &Config,
    name: String,
    user: String,
    max_songs: Option<u32>,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Songwriter name must not be empty");
    }

    let db_path = config.database_path.clone();
    let mut request = DiscoveryRequest::new(name, user);
    if let Some(max_songs) = max_songs {
        request = request.with_max_songs(max_songs);
    }

    Database::open(&db_path)?
        .insert_request(&request)
        .context("Failed to create discovery request")?;

    println!("\n🎼 Repertoire Discovery\n");
    println!("  Songwriter: {}", request.songwriter_name);
    println!("  Request: {}", request.id);
    println!("  Database: {}", db_path.display());
    println!();

    let engine = DiscoveryEngine::from_config(config).context("Failed to build discovery engine")?;
    let workflow =
        build_discovery_workflow(engine, db_path.clone()).context("Failed to build workflow")?;

    let parent = db_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
    let state_path = parent.join("pipeline.db");
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    let job = DiscoveryJob::from(&request);

    let mut events = workflow.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    println!("  ⏳ [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    println!("  ✓ [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  ✗ [{stage}] FAILED: {error}");
                }
                _ => {}
            }
        }
    });

    log::info!("Running discovery for {}", job);
    let advanced = workflow.advance(&job, &mut store).await;

    let failure = advanced.as_ref().err().map(ToString::to_string);
    let finished = settle_request(&db_path, &request, failure.as_deref())?;
    advanced.context("Discovery workflow failed")?;

    println!();
    print_request(&finished);

    if finished.status == RequestStatus::Completed {
        println!("\nRun 'repertoire works {}' to list the discovered works", finished.id);
    }

    Ok(())
}

/// Reload the request after the workflow ran, failing it if nothing moved
/// it out of `processing`.
fn settle_request(
    db_path: &Path,
    request: &DiscoveryRequest,
    failure: Option<&str>,
) -> Result<DiscoveryRequest> {
    let db = Database::open(db_path)?;
    let stored = db
        .get_request(&request.id)?
        .ok_or_else(|| anyhow::anyhow!("Discovery request {} disappeared", request.id))?;

    if stored.status != RequestStatus::Processing {
        return Ok(stored);
    }

    let message = failure.unwrap_or("Discovery did not complete");
    log::warn!("Request {} still processing; marking failed", request.id);
    db.mark_request_failed(&request.id, message)?;

    db.get_request(&request.id)?
        .ok_or_else(|| anyhow::anyhow!("Discovery request {} disappeared", request.id))
}
