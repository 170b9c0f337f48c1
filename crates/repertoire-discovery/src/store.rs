//! Persistence seam for discovery results.

use std::fmt;
use std::path::PathBuf;

use repertoire_core::model::{DiscoveredWorkRow, RequestCompletion};
use repertoire_core::schema::Database;

use crate::error::DiscoveryResult;

/// Where the engine writes discovered works and request completion.
pub trait DiscoveryStore: Send + Sync + fmt::Debug {
    /// Store all rows atomically, returning how many were written.
    fn insert_discovered_works(&self, rows: &[DiscoveredWorkRow]) -> DiscoveryResult<usize>;

    /// Write aggregate results and move the request to `completed`.
    fn complete_request(&self, completion: &RequestCompletion) -> DiscoveryResult<()>;
}

/// [`DiscoveryStore`] backed by the SQLite database.
///
/// A connection is opened per call so the store can be shared across tasks
/// without holding a `rusqlite::Connection` across await points.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> DiscoveryResult<Database> {
        Ok(Database::open(&self.db_path)?)
    }
}

impl DiscoveryStore for SqliteStore {
    fn insert_discovered_works(&self, rows: &[DiscoveredWorkRow]) -> DiscoveryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        Ok(self.open()?.insert_discovered_works(rows)?)
    }

    fn complete_request(&self, completion: &RequestCompletion) -> DiscoveryResult<()> {
        Ok(self.open()?.complete_request(completion)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire_core::model::{CareerOverview, DiscoveryRequest, RequestStatus};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("store.db");

        let request = DiscoveryRequest::new("Jane Doe", "user-1");
        Database::open(&db_path)
            .unwrap()
            .insert_request(&request)
            .unwrap();

        let store = SqliteStore::new(&db_path);
        let row = DiscoveredWorkRow::new(request.id, "user-1", "Blue Sky");
        assert_eq!(store.insert_discovered_works(&[row]).unwrap(), 1);
        assert_eq!(store.insert_discovered_works(&[]).unwrap(), 0);

        store
            .complete_request(&RequestCompletion {
                request_id: request.id,
                total_found: 1,
                metadata_complete_count: 0,
                summary: "Found 1 work".to_string(),
                career_overview: CareerOverview::default(),
                source_report: BTreeMap::new(),
            })
            .unwrap();

        let db = Database::open(&db_path).unwrap();
        let stored = db.get_request(&request.id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Completed);
        assert_eq!(db.list_discovered_works(&request.id).unwrap().len(), 1);
    }

    #[test]
    fn test_completing_unknown_request_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("store.db"));
        let result = store.complete_request(&RequestCompletion {
            request_id: repertoire_core::model::RequestId::new(),
            total_found: 0,
            metadata_complete_count: 0,
            summary: String::new(),
            career_overview: CareerOverview::default(),
            source_report: BTreeMap::new(),
        });
        assert!(result.is_err());
    }
}
