//! Deliberate corruption of a seeded dataset, for data-quality drills.
//! Sampling is approximate and row-count-proportional, driven by SQLite's
//! per-row random(); the exact hit counts vary run to run.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use rusqlite::params;
use serde::Serialize;

use crate::db::Database;

#[derive(Debug, Clone, Serialize)]
pub struct ChaosReport {
    pub jobs_backdated: usize,
    pub jobs_blanked: usize,
    pub views_duplicated: usize,
    pub applications_unset: usize,
}

/// Applies the four corruptions in one transaction; a failure in any of
/// them rolls all four back and leaves the data intact.
pub fn apply_chaos(db: &mut Database) -> Result<ChaosReport> {
    let mut rng = rand::thread_rng();
    let tx = db.conn.transaction()?;

    // ~1% of jobs get an update stamp 1-10 days before posting, breaking
    // the last_updated >= posted_at invariant the health check looks for.
    // The new timestamp is computed here rather than in SQL so every
    // stored value keeps the one text format the bindings write.
    let backdate_targets: Vec<(i64, NaiveDateTime)> = {
        let mut stmt = tx
            .prepare("SELECT job_id, posted_at FROM jobs WHERE (abs(random()) % 100) < 1")
            .context("Failed to sample jobs for backdating")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    let jobs_backdated = backdate_targets.len();
    {
        let mut update = tx.prepare("UPDATE jobs SET last_updated = ?1 WHERE job_id = ?2")?;
        for (job_id, posted_at) in &backdate_targets {
            let days = rng.gen_range(1..=10);
            update.execute(params![*posted_at - Duration::days(days), job_id])?;
        }
    }

    // ~0.5% of jobs lose category and location
    let jobs_blanked = tx
        .execute(
            "UPDATE jobs SET category = NULL, location = NULL \
             WHERE (abs(random()) % 1000) < 5",
            [],
        )
        .context("Failed to blank job fields")?;

    // ~0.2% of views duplicated verbatim, like a replayed event log
    let views_duplicated = tx
        .execute(
            "INSERT INTO job_views (job_id, user_id, viewed_at) \
             SELECT job_id, user_id, viewed_at FROM job_views \
             WHERE (abs(random()) % 1000) < 2",
            [],
        )
        .context("Failed to duplicate views")?;

    // ~1% of applications lose their status
    let applications_unset = tx
        .execute(
            "UPDATE job_applications SET status = NULL \
             WHERE (abs(random()) % 100) < 1",
            [],
        )
        .context("Failed to unset application statuses")?;

    tx.commit()?;
    Ok(ChaosReport {
        jobs_backdated,
        jobs_blanked,
        views_duplicated,
        applications_unset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;

    fn fixture() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("chaos.db"),
        };
        let db = Database::open(&config).unwrap();
        db.init().unwrap();
        (dir, db)
    }

    // Hand-built fixture, big enough that every ~0.2%+ sample is non-empty
    // with overwhelming probability.
    fn populate(db: &Database, jobs: i64, views: i64, applications: i64) {
        let posted = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let updated = posted + Duration::days(30);

        db.conn
            .execute(
                "INSERT INTO companies (name, industry, country) VALUES ('Acme', 'IT', 'Norway')",
                [],
            )
            .unwrap();
        let mut job = db
            .conn
            .prepare(
                "INSERT INTO jobs (company_id, title, category, location, posted_at, \
                 is_active, last_updated) VALUES (1, 'Engineer', 'Engineering', 'Oslo', ?1, 1, ?2)",
            )
            .unwrap();
        for _ in 0..jobs {
            job.execute(params![posted, updated]).unwrap();
        }
        let mut view = db
            .conn
            .prepare("INSERT INTO job_views (job_id, user_id, viewed_at) VALUES (1, ?1, ?2)")
            .unwrap();
        for i in 0..views {
            view.execute(params![i + 1, posted + Duration::hours(1)])
                .unwrap();
        }
        let mut app = db
            .conn
            .prepare(
                "INSERT INTO job_applications (job_id, user_id, applied_at, status) \
                 VALUES (1, ?1, ?2, 'applied')",
            )
            .unwrap();
        for i in 0..applications {
            app.execute(params![i + 1, posted + Duration::days(1)])
                .unwrap();
        }
    }

    #[test]
    fn test_chaos_makes_the_health_check_fire() {
        let (_dir, mut db) = fixture();
        populate(&db, 2000, 5000, 2000);

        let before = db.check_invalid_dates().unwrap();
        assert_eq!(before.problem_count, 0);

        let report = apply_chaos(&mut db).unwrap();

        let after = db.check_invalid_dates().unwrap();
        assert!(
            after.problem_count > before.problem_count,
            "backdating must surface in the check"
        );
        assert_eq!(report.jobs_backdated as i64, after.problem_count);
    }

    #[test]
    fn test_chaos_touches_every_table() {
        let (_dir, mut db) = fixture();
        populate(&db, 2000, 5000, 2000);

        let report = apply_chaos(&mut db).unwrap();

        assert!(report.views_duplicated > 0);
        assert_eq!(
            db.count("job_views").unwrap(),
            5000 + report.views_duplicated as u64
        );

        assert!(report.applications_unset > 0);
        let null_statuses: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM job_applications WHERE status IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(null_statuses, report.applications_unset as i64);

        assert!(report.jobs_blanked > 0);
        let blanked: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM jobs WHERE category IS NULL AND location IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(blanked, report.jobs_blanked as i64);
    }

    #[test]
    fn test_duplicated_views_are_verbatim_copies() {
        let (_dir, mut db) = fixture();
        populate(&db, 100, 5000, 100);

        let report = apply_chaos(&mut db).unwrap();
        assert!(report.views_duplicated > 0);

        let distinct: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM (SELECT DISTINCT job_id, user_id, viewed_at FROM job_views)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        // every duplicate collapses onto an original row
        assert_eq!(distinct, 5000);
    }
}
