//! SQL migration definitions for the Catfeed database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: article_groups, articles",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Article groups, upserted by external_id (natural key)
CREATE TABLE IF NOT EXISTS article_groups (
    id          TEXT PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Articles, upserted by sku (natural key). Nested sequences are stored
-- as JSON documents; group_id holds the internal id of the owning group.
CREATE TABLE IF NOT EXISTS articles (
    id                   TEXT PRIMARY KEY,
    sku                  TEXT NOT NULL UNIQUE,
    type_number          TEXT,
    description          TEXT,
    external_id          TEXT,
    group_id             TEXT REFERENCES article_groups(id) ON DELETE SET NULL,
    specifications_json  TEXT NOT NULL DEFAULT '[]',
    assets_json          TEXT NOT NULL DEFAULT '[]',
    classifications_json TEXT NOT NULL DEFAULT '[]',
    related_json         TEXT NOT NULL DEFAULT '[]',
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_group_id ON articles(group_id);
CREATE INDEX IF NOT EXISTS idx_articles_external_id ON articles(external_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
