use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    CareerOverview, DiscoveredWorkRow, DiscoveryRequest, ProRegistrations, RegistrationGap,
    RequestCompletion, RequestId, RequestStatus, SourceStatus,
};

use super::migrations::MIGRATIONS;

/// A database connection with CRUD methods for discovery requests and
/// discovered works.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

const REQUEST_COLUMNS: &str = "id, songwriter_name, user_id, max_songs, status, total_found,
    metadata_complete_count, summary, career_overview, source_report, error_message,
    created_at, updated_at";

// Discovery request CRUD
impl Database {
    /// Insert a new discovery request.
    pub fn insert_request(&self, request: &DiscoveryRequest) -> Result<()> {
        let career_overview = request
            .career_overview
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            &format!("INSERT INTO discovery_requests ({REQUEST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"),
            rusqlite::params![
                request.id.to_string(),
                request.songwriter_name,
                request.user_id,
                request.max_songs,
                request.status.as_str(),
                request.total_found,
                request.metadata_complete_count,
                request.summary,
                career_overview,
                serde_json::to_string(&request.source_report)?,
                request.error_message,
                request.created_at.to_rfc3339(),
                request.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a discovery request by ID.
    pub fn get_request(&self, id: &RequestId) -> Result<Option<DiscoveryRequest>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM discovery_requests WHERE id = ?1"),
                [id.to_string()],
                RawRequest::from_row,
            )
            .optional()?;

        raw.map(RawRequest::into_request).transpose()
    }

    /// List all discovery requests, newest first.
    pub fn list_requests(&self) -> Result<Vec<DiscoveryRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM discovery_requests ORDER BY created_at DESC"
        ))?;

        let raws = stmt
            .query_map([], RawRequest::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawRequest::into_request).collect()
    }

    /// Write discovery results and move the request to `completed`.
    pub fn complete_request(&self, completion: &RequestCompletion) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE discovery_requests SET
                status = ?2, total_found = ?3, metadata_complete_count = ?4,
                summary = ?5, career_overview = ?6, source_report = ?7,
                error_message = NULL, updated_at = ?8
             WHERE id = ?1",
            rusqlite::params![
                completion.request_id.to_string(),
                RequestStatus::Completed.as_str(),
                completion.total_found,
                completion.metadata_complete_count,
                completion.summary,
                serde_json::to_string(&completion.career_overview)?,
                serde_json::to_string(&completion.source_report)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound {
                entity: "discovery request",
                id: completion.request_id.to_string(),
            });
        }
        Ok(())
    }

    /// Move a request to `failed`, recording the error message.
    pub fn mark_request_failed(&self, id: &RequestId, message: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE discovery_requests SET status = ?2, error_message = ?3, updated_at = ?4
             WHERE id = ?1",
            rusqlite::params![
                id.to_string(),
                RequestStatus::Failed.as_str(),
                message,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound {
                entity: "discovery request",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Column values of a `discovery_requests` row before decoding.
struct RawRequest {
    id: String,
    songwriter_name: String,
    user_id: String,
    max_songs: Option<u32>,
    status: String,
    total_found: u32,
    metadata_complete_count: u32,
    summary: Option<String>,
    career_overview: Option<String>,
    source_report: String,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawRequest {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            songwriter_name: row.get(1)?,
            user_id: row.get(2)?,
            max_songs: row.get(3)?,
            status: row.get(4)?,
            total_found: row.get(5)?,
            metadata_complete_count: row.get(6)?,
            summary: row.get(7)?,
            career_overview: row.get(8)?,
            source_report: row.get(9)?,
            error_message: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_request(self) -> Result<DiscoveryRequest> {
        let career_overview: Option<CareerOverview> = self
            .career_overview
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let source_report: BTreeMap<String, SourceStatus> =
            serde_json::from_str(&self.source_report)?;

        Ok(DiscoveryRequest {
            id: self.id.parse()?,
            songwriter_name: self.songwriter_name,
            user_id: self.user_id,
            max_songs: self.max_songs,
            status: self.status.parse()?,
            total_found: self.total_found,
            metadata_complete_count: self.metadata_complete_count,
            summary: self.summary,
            career_overview,
            source_report,
            error_message: self.error_message,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

// Discovered work CRUD
impl Database {
    /// Insert discovered-work rows in a single transaction.
    ///
    /// Either every row is stored or none is.
    pub fn insert_discovered_works(&self, rows: &[DiscoveredWorkRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO discovered_works (
                    id, request_id, user_id, title, iswc, co_writers, publishers,
                    ascap_registered, bmi_registered, sesac_registered,
                    registration_gaps, metadata_completeness_score,
                    verification_status, source_data, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;

            for row in rows {
                stmt.execute(rusqlite::params![
                    row.id.to_string(),
                    row.request_id.to_string(),
                    row.user_id,
                    row.title,
                    row.iswc,
                    serde_json::to_string(&row.co_writers)?,
                    serde_json::to_string(&row.publishers)?,
                    row.pro_registrations.ascap,
                    row.pro_registrations.bmi,
                    row.pro_registrations.sesac,
                    serde_json::to_string(&row.registration_gaps)?,
                    row.metadata_completeness_score,
                    row.verification_status.as_str(),
                    serde_json::to_string(&row.source_data)?,
                    row.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// List the discovered works stored for a request, in insertion order.
    pub fn list_discovered_works(&self, request_id: &RequestId) -> Result<Vec<DiscoveredWorkRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, request_id, user_id, title, iswc, co_writers, publishers,
                    ascap_registered, bmi_registered, sesac_registered,
                    registration_gaps, metadata_completeness_score,
                    verification_status, source_data, created_at
             FROM discovered_works
             WHERE request_id = ?1
             ORDER BY rowid",
        )?;

        let raws = stmt
            .query_map([request_id.to_string()], RawWorkRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawWorkRow::into_row).collect()
    }
}

/// Column values of a `discovered_works` row before decoding.
struct RawWorkRow {
    id: String,
    request_id: String,
    user_id: String,
    title: String,
    iswc: Option<String>,
    co_writers: String,
    publishers: String,
    pro_registrations: ProRegistrations,
    registration_gaps: String,
    metadata_completeness_score: f64,
    verification_status: String,
    source_data: String,
    created_at: String,
}

impl RawWorkRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            request_id: row.get(1)?,
            user_id: row.get(2)?,
            title: row.get(3)?,
            iswc: row.get(4)?,
            co_writers: row.get(5)?,
            publishers: row.get(6)?,
            pro_registrations: ProRegistrations {
                ascap: row.get(7)?,
                bmi: row.get(8)?,
                sesac: row.get(9)?,
            },
            registration_gaps: row.get(10)?,
            metadata_completeness_score: row.get(11)?,
            verification_status: row.get(12)?,
            source_data: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    fn into_row(self) -> Result<DiscoveredWorkRow> {
        let registration_gaps: Vec<RegistrationGap> =
            serde_json::from_str(&self.registration_gaps)?;

        Ok(DiscoveredWorkRow {
            id: self.id.parse()?,
            request_id: self.request_id.parse()?,
            user_id: self.user_id,
            title: self.title,
            iswc: self.iswc,
            co_writers: serde_json::from_str(&self.co_writers)?,
            publishers: serde_json::from_str(&self.publishers)?,
            pro_registrations: self.pro_registrations,
            registration_gaps,
            metadata_completeness_score: self.metadata_completeness_score,
            verification_status: self.verification_status.parse()?,
            source_data: serde_json::from_str(&self.source_data)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::InvalidData(format!("invalid timestamp {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceTag, VerificationStatus};
    use serde_json::json;

    fn sample_row(request_id: RequestId, title: &str) -> DiscoveredWorkRow {
        let mut row = DiscoveredWorkRow::new(request_id, "user-1", title);
        row.iswc = Some("T-123".to_string());
        row.co_writers = vec!["Jane Doe".to_string()];
        row.publishers.insert("Blue Music".to_string(), 50.0);
        row.pro_registrations = ProRegistrations::from_sources(&[SourceTag::Ascap]);
        row.registration_gaps = vec![RegistrationGap::ConflictingSplits];
        row.metadata_completeness_score = 0.9;
        row.verification_status = VerificationStatus::ProVerified;
        row.source_data = json!({"sources": ["ascap"]});
        row
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_request_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let request = DiscoveryRequest::new("Jane Doe", "user-1").with_max_songs(10);
        db.insert_request(&request).unwrap();

        let loaded = db.get_request(&request.id).unwrap().unwrap();
        assert_eq!(loaded.songwriter_name, "Jane Doe");
        assert_eq!(loaded.max_songs, Some(10));
        assert_eq!(loaded.status, RequestStatus::Processing);
        assert!(loaded.source_report.is_empty());
    }

    #[test]
    fn test_get_missing_request() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_request(&RequestId::new()).unwrap().is_none());
    }

    #[test]
    fn test_complete_request() {
        let db = Database::open_in_memory().unwrap();
        let request = DiscoveryRequest::new("Jane Doe", "user-1");
        db.insert_request(&request).unwrap();

        let completion = RequestCompletion {
            request_id: request.id,
            total_found: 3,
            metadata_complete_count: 2,
            summary: "Found 3 works".to_string(),
            career_overview: CareerOverview::default(),
            source_report: BTreeMap::from([("ascap".to_string(), SourceStatus::Failed)]),
        };
        db.complete_request(&completion).unwrap();

        let loaded = db.get_request(&request.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Completed);
        assert_eq!(loaded.total_found, 3);
        assert_eq!(loaded.metadata_complete_count, 2);
        assert_eq!(loaded.summary.as_deref(), Some("Found 3 works"));
        assert_eq!(loaded.career_overview, Some(CareerOverview::default()));
        assert_eq!(loaded.source_report.get("ascap"), Some(&SourceStatus::Failed));
    }

    #[test]
    fn test_complete_unknown_request_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let completion = RequestCompletion {
            request_id: RequestId::new(),
            total_found: 0,
            metadata_complete_count: 0,
            summary: String::new(),
            career_overview: CareerOverview::default(),
            source_report: BTreeMap::new(),
        };
        let result = db.complete_request(&completion);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_mark_request_failed() {
        let db = Database::open_in_memory().unwrap();
        let request = DiscoveryRequest::new("Jane Doe", "user-1");
        db.insert_request(&request).unwrap();

        db.mark_request_failed(&request.id, "catalog unreachable").unwrap();

        let loaded = db.get_request(&request.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("catalog unreachable"));
    }

    #[test]
    fn test_discovered_works_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let request = DiscoveryRequest::new("Jane Doe", "user-1");
        db.insert_request(&request).unwrap();

        let rows = vec![
            sample_row(request.id, "Blue Sky"),
            sample_row(request.id, "Night Train"),
        ];
        assert_eq!(db.insert_discovered_works(&rows).unwrap(), 2);

        let loaded = db.list_discovered_works(&request.id).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Blue Sky");
        assert_eq!(loaded[1].title, "Night Train");
        assert_eq!(loaded[0].publishers.get("Blue Music"), Some(&50.0));
        assert!(loaded[0].pro_registrations.ascap);
        assert!(loaded[0].has_gap(RegistrationGap::ConflictingSplits));
        assert_eq!(loaded[0].verification_status, VerificationStatus::ProVerified);
    }

    #[test]
    fn test_discovered_works_insert_is_atomic() {
        let db = Database::open_in_memory().unwrap();
        let request = DiscoveryRequest::new("Jane Doe", "user-1");
        db.insert_request(&request).unwrap();

        let first = sample_row(request.id, "Blue Sky");
        let duplicate = first.clone();
        let result = db.insert_discovered_works(&[first, duplicate]);
        assert!(result.is_err());

        let loaded = db.list_discovered_works(&request.id).unwrap();
        assert!(loaded.is_empty());
    }
}
