pub const SCHEMA: &str = r#"
-- Projects group files and anchor the middle settings tier
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Shared files; bytes live in the blob store, blob_url serves them
CREATE TABLE IF NOT EXISTS files (
    id TEXT PRIMARY KEY,
    project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    public_id TEXT NOT NULL UNIQUE,   -- unguessable share-link key
    blob_url TEXT NOT NULL,
    expires_at TEXT,                  -- NULL = never; fixed at registration
    download_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Admin sessions; only the SHA-256 digest of the cookie token is stored
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- Login audit trail, append-only; doubles as the throttle window input
CREATE TABLE IF NOT EXISTS login_attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ip TEXT NOT NULL,
    outcome TEXT NOT NULL,            -- 'success' | 'failed' | 'throttled'
    user_agent TEXT,
    attempted_at TEXT NOT NULL
);

-- Sharing settings tiers, one JSON document per scope
CREATE TABLE IF NOT EXISTS share_settings (
    scope TEXT NOT NULL,              -- 'global' | 'project' | 'file'
    scope_id TEXT NOT NULL DEFAULT '',
    settings TEXT NOT NULL,           -- JSON
    updated_at TEXT NOT NULL,
    PRIMARY KEY (scope, scope_id)
);

-- Optional per-file share password (0 or 1 per file)
CREATE TABLE IF NOT EXISTS share_passwords (
    file_id TEXT PRIMARY KEY REFERENCES files(id) ON DELETE CASCADE,
    hash TEXT NOT NULL,               -- hex PBKDF2-HMAC-SHA256 output
    salt TEXT NOT NULL,               -- hex random salt
    created_at TEXT DEFAULT (datetime('now'))
);

-- Successful downloads, append-only; population of the per-IP rate window
CREATE TABLE IF NOT EXISTS download_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    ip TEXT NOT NULL,
    user_agent TEXT,
    downloaded_at TEXT NOT NULL
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id);
CREATE INDEX IF NOT EXISTS idx_login_attempts_ip_time ON login_attempts(ip, attempted_at);
CREATE INDEX IF NOT EXISTS idx_download_log_file_ip_time ON download_log(file_id, ip, downloaded_at);
"#;
