use anyhow::{Context, Result};
use std::path::Path;

use repertoire_core::model::{DiscoveredWorkRow, RequestId};
use repertoire_core::schema::Database;

/// List the works discovered for a request.
pub fn list_works(db_path: &Path, request_id: &str, json: bool) -> Result<()> {
    let id: RequestId = request_id
        .parse()
        .with_context(|| format!("Invalid request ID: {request_id}"))?;

    let db = Database::open(db_path)?;
    if db.get_request(&id)?.is_none() {
        anyhow::bail!("Discovery request not found: {id}");
    }
    let rows = db.list_discovered_works(&id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("Failed to serialize works")?
        );
        return Ok(());
    }

    if rows.is_empty() {
        println!("No works discovered for request {id}");
        return Ok(());
    }

    println!("\n🎵 {} discovered works\n", rows.len());
    for row in &rows {
        print_row(row);
    }

    Ok(())
}

fn print_row(row: &DiscoveredWorkRow) {
    let marker = if row.is_pro_verified() { "✓" } else { "·" };
    println!(
        "{} {}  [{}]",
        marker,
        row.title,
        row.iswc.as_deref().unwrap_or("no ISWC")
    );

    if !row.co_writers.is_empty() {
        println!("    Writers: {}", row.co_writers.join(", "));
    }
    if !row.publishers.is_empty() {
        let publishers: Vec<String> = row
            .publishers
            .iter()
            .map(|(name, share)| format!("{name} ({share}%)"))
            .collect();
        println!("    Publishers: {}", publishers.join(", "));
    }

    let pros: Vec<&str> = [
        ("ASCAP", row.pro_registrations.ascap),
        ("BMI", row.pro_registrations.bmi),
        ("SESAC", row.pro_registrations.sesac),
    ]
    .into_iter()
    .filter_map(|(name, registered)| registered.then_some(name))
    .collect();
    if !pros.is_empty() {
        println!("    PROs: {}", pros.join(", "));
    }

    if !row.registration_gaps.is_empty() {
        let gaps: Vec<&str> = row.registration_gaps.iter().map(|g| g.as_str()).collect();
        println!("    ⚠ Gaps: {}", gaps.join(", "));
    }
}
