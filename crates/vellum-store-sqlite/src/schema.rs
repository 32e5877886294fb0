//! SQL schema for the Vellum SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    title       TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    created_at  TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Versions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS document_versions (
    version_id      TEXT PRIMARY KEY,
    document_id     TEXT NOT NULL REFERENCES documents(document_id),
    status          TEXT NOT NULL,   -- 'RAW'|'PROCESSED'|'APPROVED'|'ACTIVE_FINAL'
    content_path    TEXT NOT NULL,
    checksum_sha256 TEXT NOT NULL,
    size_bytes      INTEGER NOT NULL,
    media_type      TEXT NOT NULL,
    derived_from    TEXT REFERENCES document_versions(version_id),
    created_by      TEXT NOT NULL,
    notes           TEXT,
    created_at      TEXT NOT NULL
);

-- A previously active version replaced by a newer published one.
CREATE TABLE IF NOT EXISTS supersessions (
    supersession_id TEXT PRIMARY KEY,
    old_version_id  TEXT NOT NULL REFERENCES document_versions(version_id),
    new_version_id  TEXT NOT NULL REFERENCES document_versions(version_id),
    recorded_at     TEXT NOT NULL,
    UNIQUE (old_version_id),
    CHECK  (old_version_id != new_version_id)
);

-- Append-only; never mutated after insert.
CREATE TABLE IF NOT EXISTS audit_events (
    audit_id    TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    kind        TEXT NOT NULL,
    severity    TEXT NOT NULL,
    message     TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    actor_id    TEXT NOT NULL,
    actor_name  TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_tenant_idx  ON documents(tenant_id);
CREATE INDEX IF NOT EXISTS versions_document_idx ON document_versions(document_id);
CREATE INDEX IF NOT EXISTS versions_status_idx   ON document_versions(status);
CREATE INDEX IF NOT EXISTS audit_entity_idx      ON audit_events(tenant_id, entity_id);

-- An APPROVED version may be consumed by publish at most once.
CREATE UNIQUE INDEX IF NOT EXISTS versions_published_from_idx
    ON document_versions(derived_from) WHERE status = 'ACTIVE_FINAL';

PRAGMA user_version = 1;
";
