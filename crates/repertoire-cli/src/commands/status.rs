use anyhow::{Context, Result};
use std::path::Path;

use repertoire_core::model::{DiscoveryRequest, RequestId, RequestStatus};
use repertoire_core::schema::Database;

/// Show one request in detail, or a table of all requests.
pub fn show_status(db_path: &Path, request_id: Option<&str>) -> Result<()> {
    let db = Database::open(db_path)?;

    if let Some(id) = request_id {
        let id: RequestId = id
            .parse()
            .with_context(|| format!("Invalid request ID: {id}"))?;
        let request = db
            .get_request(&id)?
            .ok_or_else(|| anyhow::anyhow!("Discovery request not found: {id}"))?;
        print_request(&request);
        return Ok(());
    }

    let requests = db.list_requests()?;

    println!("\n📊 Repertoire Status\n");
    println!("  Database: {}", db_path.display());
    println!("  Requests: {}", requests.len());

    if requests.is_empty() {
        println!("\n  Run `repertoire discover <name>` to start a discovery");
        return Ok(());
    }

    println!();
    for request in &requests {
        println!(
            "  {}  {:<10}  {:>4} works  {}",
            request.id,
            request.status,
            request.total_found,
            request.songwriter_name
        );
    }

    Ok(())
}

/// Print a request with its results and source report.
pub(crate) fn print_request(request: &DiscoveryRequest) {
    let icon = match request.status {
        RequestStatus::Processing => "⏳",
        RequestStatus::Completed => "✓",
        RequestStatus::Failed => "✗",
    };

    println!("{} {} [{}]", icon, request.songwriter_name, request.status);
    println!("  Request: {}", request.id);
    println!("  User: {}", request.user_id);
    if let Some(max_songs) = request.max_songs {
        println!("  Max songs: {}", max_songs);
    }
    println!("  Created: {}", request.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

    match request.status {
        RequestStatus::Processing => {}
        RequestStatus::Failed => {
            println!(
                "  Error: {}",
                request.error_message.as_deref().unwrap_or("<unknown>")
            );
        }
        RequestStatus::Completed => {
            println!("  Works found: {}", request.total_found);
            println!("  Metadata complete: {}", request.metadata_complete_count);
            if let Some(overview) = &request.career_overview {
                println!("  Territory: {}", overview.territory);
                if let Some(biography) = &overview.biography {
                    println!("  Biography: {}", biography);
                }
            }
            if let Some(summary) = &request.summary {
                println!("\n  {}", summary);
            }
        }
    }

    if !request.source_report.is_empty() {
        println!("\n  Sources:");
        for (source, status) in &request.source_report {
            println!("    {:<16} {}", source, status);
        }
    }
}
