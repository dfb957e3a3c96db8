/// Each collection is a table of JSON document bodies keyed by `_id`.
pub const SCHEMA: &str = r#"
-- Tracked (owner, repo, branch) triples
CREATE TABLE IF NOT EXISTS "repo" (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Latest analyzed snapshot per (repo_id, path)
CREATE TABLE IF NOT EXISTS "file" (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Analyzed functions, owned by a file
CREATE TABLE IF NOT EXISTS "function" (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Registered users (salted password hashes only)
CREATE TABLE IF NOT EXISTS "user" (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Session cookies
CREATE TABLE IF NOT EXISTS "cookie" (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
"#;
