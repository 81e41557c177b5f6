//! SQL schema for the Schemata SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identities. Created once, mutated only by setting deleted_at.
CREATE TABLE IF NOT EXISTS schemes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,     -- RFC 3339 UTC, microsecond precision
    deleted_at  TEXT               -- NULL while live
);

CREATE TABLE IF NOT EXISTS configs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    scheme_id   INTEGER NOT NULL REFERENCES schemes(id),
    created_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- Version ledgers are strictly append-only.
-- No UPDATE or DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS scheme_versions (
    scheme_id   INTEGER NOT NULL REFERENCES schemes(id),
    version     INTEGER NOT NULL CHECK (version >= 1),
    tags        TEXT NOT NULL,     -- sorted JSON array of strings
    data        BLOB NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (scheme_id, version)
);

CREATE TABLE IF NOT EXISTS config_versions (
    config_id   INTEGER NOT NULL REFERENCES configs(id),
    scheme_id   INTEGER NOT NULL REFERENCES schemes(id),  -- copied from configs
    version     INTEGER NOT NULL CHECK (version >= 1),
    tags        TEXT NOT NULL,
    data        BLOB NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (config_id, version)
);

CREATE TRIGGER IF NOT EXISTS scheme_versions_no_update
BEFORE UPDATE ON scheme_versions
BEGIN SELECT RAISE(ABORT, 'scheme_versions is append-only'); END;

CREATE TRIGGER IF NOT EXISTS scheme_versions_no_delete
BEFORE DELETE ON scheme_versions
BEGIN SELECT RAISE(ABORT, 'scheme_versions is append-only'); END;

CREATE TRIGGER IF NOT EXISTS config_versions_no_update
BEFORE UPDATE ON config_versions
BEGIN SELECT RAISE(ABORT, 'config_versions is append-only'); END;

CREATE TRIGGER IF NOT EXISTS config_versions_no_delete
BEFORE DELETE ON config_versions
BEGIN SELECT RAISE(ABORT, 'config_versions is append-only'); END;

CREATE TRIGGER IF NOT EXISTS schemes_no_delete
BEFORE DELETE ON schemes
BEGIN SELECT RAISE(ABORT, 'schemes are soft-deleted only'); END;

CREATE TRIGGER IF NOT EXISTS configs_no_delete
BEFORE DELETE ON configs
BEGIN SELECT RAISE(ABORT, 'configs are soft-deleted only'); END;

CREATE INDEX IF NOT EXISTS configs_scheme_idx         ON configs(scheme_id);
CREATE INDEX IF NOT EXISTS config_versions_scheme_idx ON config_versions(scheme_id);

PRAGMA user_version = 1;
";
