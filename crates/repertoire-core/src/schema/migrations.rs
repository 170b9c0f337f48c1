/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Discovery requests (job records owned by the caller)
CREATE TABLE IF NOT EXISTS discovery_requests (
    id TEXT PRIMARY KEY,
    songwriter_name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    max_songs INTEGER,
    status TEXT NOT NULL,
    total_found INTEGER NOT NULL DEFAULT 0,
    metadata_complete_count INTEGER NOT NULL DEFAULT 0,
    summary TEXT,
    career_overview TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_discovery_requests_user_id ON discovery_requests(user_id);
CREATE INDEX IF NOT EXISTS idx_discovery_requests_status ON discovery_requests(status);

-- Discovered works (insert-only output rows)
CREATE TABLE IF NOT EXISTS discovered_works (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL REFERENCES discovery_requests(id),
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    iswc TEXT,
    co_writers TEXT NOT NULL,
    publishers TEXT NOT NULL,
    ascap_registered INTEGER NOT NULL DEFAULT 0,
    bmi_registered INTEGER NOT NULL DEFAULT 0,
    sesac_registered INTEGER NOT NULL DEFAULT 0,
    registration_gaps TEXT NOT NULL,
    metadata_completeness_score REAL NOT NULL,
    verification_status TEXT NOT NULL,
    source_data TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_discovered_works_request_id ON discovered_works(request_id);
CREATE INDEX IF NOT EXISTS idx_discovered_works_iswc ON discovered_works(iswc);
"#;

const MIGRATION_002: &str = r#"
-- Per-collector outcomes and failure messages on requests
ALTER TABLE discovery_requests ADD COLUMN source_report TEXT NOT NULL DEFAULT '{}';
ALTER TABLE discovery_requests ADD COLUMN error_message TEXT;
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "request_source_report",
        sql: MIGRATION_002,
    },
];
