//! SQL schema for the Tenet SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Votes are strictly append-only.
-- The triggers below turn any UPDATE or DELETE into an error.
CREATE TABLE IF NOT EXISTS votes (
    vote_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    topic       TEXT NOT NULL,   -- canonical topic name
    article_id  TEXT NOT NULL,
    stance      TEXT NOT NULL,   -- 'AGREE' | 'DISAGREE' | 'UNSURE'
    belief_text TEXT NOT NULL,
    belief_key  TEXT NOT NULL,
    confidence  TEXT,            -- 'low' | 'medium' | 'high' or NULL
    note        TEXT,
    claim       TEXT,
    conditions  TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    contradicts TEXT NOT NULL DEFAULT '[]',   -- JSON array of belief keys
    created_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed microsecond width
);

CREATE TRIGGER IF NOT EXISTS votes_no_update BEFORE UPDATE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END;

CREATE TRIGGER IF NOT EXISTS votes_no_delete BEFORE DELETE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END;

CREATE INDEX IF NOT EXISTS votes_stream_idx ON votes(user_id, topic, created_at, vote_id);
CREATE INDEX IF NOT EXISTS votes_user_idx   ON votes(user_id, created_at, vote_id);

PRAGMA user_version = 1;
";
