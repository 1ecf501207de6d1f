use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

pub struct Database {
    pub(crate) conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.db_path.clone();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::tune(&conn)?;
        Ok(Self { conn, path })
    }

    fn tune(conn: &Connection) -> Result<()> {
        // WAL keeps read connections valid while this one commits chunks.
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| {
            row.get::<_, String>(0)
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Second connection for streaming scans. Opened read-only so the scan
    /// can never be entangled with the writer's transactions: the two are
    /// siblings, and chunk commits on the write side leave the scan intact.
    pub fn open_reader(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open read connection: {}", self.path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                company_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                industry TEXT,
                country TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS jobs (
                job_id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES companies(company_id),
                title TEXT NOT NULL,
                category TEXT,
                location TEXT,
                salary_from INTEGER,
                salary_to INTEGER,
                posted_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS job_views (
                job_id INTEGER NOT NULL REFERENCES jobs(job_id),
                user_id INTEGER NOT NULL,
                viewed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS job_applications (
                application_id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(job_id),
                user_id INTEGER NOT NULL,
                applied_at TEXT NOT NULL,
                status TEXT CHECK (status IN ('applied', 'rejected', 'hired'))
            );

            CREATE TABLE IF NOT EXISTS job_status_history (
                job_id INTEGER NOT NULL REFERENCES jobs(job_id),
                status TEXT NOT NULL CHECK (status IN ('active', 'paused', 'closed')),
                changed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);
            CREATE INDEX IF NOT EXISTS idx_views_job ON job_views(job_id);
            CREATE INDEX IF NOT EXISTS idx_applications_job ON job_applications(job_id);
            CREATE INDEX IF NOT EXISTS idx_history_job ON job_status_history(job_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!("Database not initialized. Run 'jobseed init' first."));
        }
        Ok(())
    }

    pub fn count(&self, table: &str) -> Result<u64> {
        let n: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
        Ok(n as u64)
    }

    /// Generating into a table whose parent rows are missing is a fatal
    /// phase error, caught up front instead of mid-run.
    pub fn ensure_rows(&self, table: &str, hint: &str) -> Result<()> {
        if self.count(table)? == 0 {
            return Err(anyhow!("Table '{}' is empty. {}", table, hint));
        }
        Ok(())
    }

    pub fn company_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT company_id FROM companies")?;
        let ids = stmt.query_map([], |row| row.get(0))?;
        ids.collect::<Result<Vec<_>, _>>()
            .context("Failed to load company ids")
    }

    pub fn job_postings(&self) -> Result<Vec<(i64, NaiveDateTime)>> {
        let mut stmt = self.conn.prepare("SELECT job_id, posted_at FROM jobs")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to load job postings")
    }

    /// Data quality check: last_updated must be >= posted_at. Returns the
    /// violation count plus up to 5 sample rows for debugging.
    pub fn check_invalid_dates(&self) -> Result<DateCheck> {
        let problem_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE last_updated < posted_at",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT job_id, posted_at, last_updated
             FROM jobs
             WHERE last_updated < posted_at
             ORDER BY last_updated
             LIMIT 5",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(InvalidJob {
                job_id: row.get(0)?,
                posted_at: row.get(1)?,
                last_updated: row.get(2)?,
            })
        })?;
        let samples = rows
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load invalid-date samples")?;

        Ok(DateCheck {
            check_name: "invalid_job_dates",
            problem_count,
            samples,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidJob {
    pub job_id: i64,
    pub posted_at: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateCheck {
    pub check_name: &'static str,
    pub problem_count: i64,
    pub samples: Vec<InvalidJob>,
}
