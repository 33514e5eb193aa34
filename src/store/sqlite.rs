use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests and embedders.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_outcome(s: &str) -> AttemptOutcome {
    AttemptOutcome::parse(s).unwrap_or_else(|| {
        tracing::error!("Invalid login attempt outcome in database: '{}'", s);
        AttemptOutcome::Failed
    })
}

fn file_from_row(row: &Row) -> rusqlite::Result<SharedFile> {
    Ok(SharedFile {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        public_id: row.get(3)?,
        blob_url: row.get(4)?,
        expires_at: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_datetime(&s)),
        download_count: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const FILE_COLUMNS: &str =
    "id, project_id, name, public_id, blob_url, expires_at, download_count, created_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<()> {
        self.conn().execute(
            "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                project.id,
                project.name,
                format_datetime(&project.created_at)
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM projects WHERE id = ?1",
            params![id],
            |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM projects ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_project(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // File operations

    fn create_file(&self, file: &SharedFile) -> Result<()> {
        self.conn().execute(
            "INSERT INTO files (id, project_id, name, public_id, blob_url, expires_at, download_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                file.id,
                file.project_id,
                file.name,
                file.public_id,
                file.blob_url,
                file.expires_at.as_ref().map(format_datetime),
                file.download_count,
                format_datetime(&file.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_file(&self, id: &str) -> Result<Option<SharedFile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
            params![id],
            file_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_file_by_public_id(&self, public_id: &str) -> Result<Option<SharedFile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE public_id = ?1"),
            params![public_id],
            file_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_files(&self, project_id: Option<&str>) -> Result<Vec<SharedFile>> {
        let conn = self.conn();

        let rows = match project_id {
            Some(project_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?1 ORDER BY name"
                ))?;
                let rows = stmt.query_map(params![project_id], file_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {FILE_COLUMNS} FROM files ORDER BY name"))?;
                let rows = stmt.query_map([], file_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(rows)
    }

    fn delete_file(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM files WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token_digest, created_at, expires_at) VALUES (?1, ?2, ?3)",
            params![
                session.token_digest,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, token_digest: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT token_digest, created_at, expires_at FROM sessions WHERE token_digest = ?1",
            params![token_digest],
            |row| {
                Ok(Session {
                    token_digest: row.get(0)?,
                    created_at: parse_datetime(&row.get::<_, String>(1)?),
                    expires_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE token_digest = ?1",
            params![token_digest],
        )?;
        Ok(rows > 0)
    }

    // Login audit trail

    fn append_login_attempt(
        &self,
        ip: &str,
        outcome: AttemptOutcome,
        user_agent: Option<&str>,
        attempted_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO login_attempts (ip, outcome, user_agent, attempted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                ip,
                outcome.as_str(),
                user_agent,
                format_datetime(&attempted_at)
            ],
        )?;
        Ok(())
    }

    fn count_failed_logins_since(&self, ip: &str, cutoff: DateTime<Utc>) -> Result<u32> {
        let conn = self.conn();
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM login_attempts
             WHERE ip = ?1 AND outcome = 'failed' AND attempted_at >= ?2",
            params![ip, format_datetime(&cutoff)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_login_attempts(&self, limit: u32) -> Result<Vec<LoginAttempt>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, ip, outcome, user_agent, attempted_at FROM login_attempts
             ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(LoginAttempt {
                id: row.get(0)?,
                ip: row.get(1)?,
                outcome: parse_outcome(&row.get::<_, String>(2)?),
                user_agent: row.get(3)?,
                attempted_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Share settings tiers

    fn get_global_policy(&self) -> Result<Option<SharePolicy>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT settings FROM share_settings WHERE scope = 'global' AND scope_id = ''",
                [],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    fn put_global_policy(&self, policy: &SharePolicy) -> Result<()> {
        let json = serde_json::to_string(policy)?;
        self.conn().execute(
            "INSERT INTO share_settings (scope, scope_id, settings, updated_at)
             VALUES ('global', '', ?1, ?2)
             ON CONFLICT(scope, scope_id)
             DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at",
            params![json, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    fn get_overrides(
        &self,
        scope: SettingsScope,
        scope_id: &str,
    ) -> Result<Option<ShareOverrides>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT settings FROM share_settings WHERE scope = ?1 AND scope_id = ?2",
                params![scope.as_str(), scope_id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    fn put_overrides(
        &self,
        scope: SettingsScope,
        scope_id: &str,
        overrides: &ShareOverrides,
    ) -> Result<()> {
        let json = serde_json::to_string(overrides)?;
        self.conn().execute(
            "INSERT INTO share_settings (scope, scope_id, settings, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope, scope_id)
             DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at",
            params![
                scope.as_str(),
                scope_id,
                json,
                format_datetime(&Utc::now())
            ],
        )?;
        Ok(())
    }

    // Share passwords

    fn put_share_password(&self, record: &SharePasswordRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO share_passwords (file_id, hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(file_id)
             DO UPDATE SET hash = excluded.hash, salt = excluded.salt,
                           created_at = excluded.created_at",
            params![
                record.file_id,
                record.hash,
                record.salt,
                format_datetime(&record.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_share_password(&self, file_id: &str) -> Result<Option<SharePasswordRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT file_id, hash, salt, created_at FROM share_passwords WHERE file_id = ?1",
            params![file_id],
            |row| {
                Ok(SharePasswordRecord {
                    file_id: row.get(0)?,
                    hash: row.get(1)?,
                    salt: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_share_password(&self, file_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM share_passwords WHERE file_id = ?1",
            params![file_id],
        )?;
        Ok(rows > 0)
    }

    // Download log

    fn count_downloads_since(
        &self,
        file_id: &str,
        ip: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u32> {
        let conn = self.conn();
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM download_log
             WHERE file_id = ?1 AND ip = ?2 AND downloaded_at >= ?3",
            params![file_id, ip, format_datetime(&cutoff)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn record_download(
        &self,
        file_id: &str,
        ip: &str,
        user_agent: Option<&str>,
        downloaded_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // The counter bump must stay an in-database increment; a
        // read-modify-write here would lose updates under concurrency.
        let updated = tx.execute(
            "UPDATE files SET download_count = download_count + 1 WHERE id = ?1",
            params![file_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound);
        }

        tx.execute(
            "INSERT INTO download_log (file_id, ip, user_agent, downloaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![file_id, ip, user_agent, format_datetime(&downloaded_at)],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_downloads(&self, file_id: &str, limit: u32) -> Result<Vec<DownloadLogEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, file_id, ip, user_agent, downloaded_at FROM download_log
             WHERE file_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![file_id, limit], |row| {
            Ok(DownloadLogEntry {
                id: row.get(0)?,
                file_id: row.get(1)?,
                ip: row.get(2)?,
                user_agent: row.get(3)?,
                downloaded_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
