//! The generation phases. Parents are fully persisted before any derived
//! phase starts, so causal ordering only ever needs a lower bound that is
//! already on disk: views follow their job's posting, applications follow
//! the view they derive from, status history walks the job's lifetime.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::Rng;
use rusqlite::{params, Row, Transaction};
use std::collections::HashMap;

use crate::db::Database;
use crate::fake;
use crate::models::{JobLifetime, NewApplication, NewCompany, NewJob, NewView, StatusEvent};
use crate::reader::TableScan;
use crate::sample::{self, SkewedIds};
use crate::writer::BatchWriter;

/// Share of jobs treated as popular, and the odds a view lands on one.
const HOT_JOB_RATIO: f64 = 0.1;
const HOT_JOB_PROBABILITY: f64 = 0.8;
/// Views land up to ~11.5 days after posting.
const MAX_VIEW_DELAY_SECS: i64 = 1_000_000;
/// Applications follow the source view by 5 minutes to 5 days.
const MIN_APPLY_DELAY_SECS: i64 = 5 * 60;
const MAX_APPLY_DELAY_SECS: i64 = 5 * 86_400;
/// Jobs are posted within the last year.
const POSTING_WINDOW_SECS: i64 = 365 * 86_400;
/// Lifespans under a day get no intermediate status churn.
const MIN_CHURN_LIFESPAN_SECS: i64 = 86_400;

/// Roughly every 10th view turns into an application.
const VIEW_SAMPLE_SQL: &str = "SELECT rowid, job_id, user_id, viewed_at FROM job_views \
     WHERE rowid > ?1 AND (abs(random()) % 10) = 0 ORDER BY rowid LIMIT ?2";

const JOB_SCAN_SQL: &str = "SELECT rowid, job_id, posted_at, last_updated, is_active FROM jobs \
     WHERE rowid > ?1 ORDER BY rowid LIMIT ?2";

pub fn seed_companies(db: &mut Database, count: u64, chunk_size: usize) -> Result<u64> {
    let mut rng = rand::thread_rng();
    let mut writer = BatchWriter::new(&mut db.conn, "companies", count, chunk_size, insert_companies);
    for _ in 0..count {
        writer.push(fake::company(&mut rng))?;
    }
    Ok(writer.finish()?.written)
}

pub fn seed_jobs(db: &mut Database, total: u64, chunk_size: usize) -> Result<u64> {
    let company_ids = db.company_ids()?;
    if company_ids.is_empty() {
        return Err(anyhow!("Table 'companies' is empty. Seed companies before jobs."));
    }

    let now = now_secs();
    let horizon = now - Duration::seconds(POSTING_WINDOW_SECS);
    let mut rng = rand::thread_rng();
    let mut writer = BatchWriter::new(&mut db.conn, "jobs", total, chunk_size, insert_jobs);
    for _ in 0..total {
        let posted_at = sample::between(&mut rng, horizon, now);
        let last_updated = sample::between(&mut rng, posted_at, now);
        let (salary_from, salary_to) = fake::salary_pair(&mut rng);
        writer.push(NewJob {
            company_id: company_ids[rng.gen_range(0..company_ids.len())],
            title: fake::job_title(&mut rng),
            category: fake::category(&mut rng).to_string(),
            location: fake::city(&mut rng).to_string(),
            salary_from,
            salary_to,
            posted_at,
            is_active: rng.gen_bool(0.5),
            last_updated,
        })?;
    }
    Ok(writer.finish()?.written)
}

pub fn seed_views(db: &mut Database, total: u64, chunk_size: usize) -> Result<u64> {
    let postings = db.job_postings()?;
    if postings.is_empty() {
        return Err(anyhow!("Table 'jobs' is empty. Seed jobs before views."));
    }
    let posted_dates: HashMap<i64, NaiveDateTime> = postings.iter().copied().collect();
    let ids: Vec<i64> = postings.iter().map(|(id, _)| *id).collect();
    let skew = SkewedIds::split(ids, HOT_JOB_RATIO)?;

    let mut rng = rand::thread_rng();
    let mut writer = BatchWriter::new(&mut db.conn, "views", total, chunk_size, insert_views);
    for _ in 0..total {
        let job_id = skew.pick(&mut rng, HOT_JOB_PROBABILITY);
        let Some(&posted_at) = posted_dates.get(&job_id) else {
            continue;
        };
        writer.push(NewView {
            job_id,
            user_id: fake::user_id(&mut rng),
            viewed_at: sample::after(&mut rng, posted_at, 0, MAX_VIEW_DELAY_SECS),
        })?;
    }
    Ok(writer.finish()?.written)
}

/// Streams a sample of views and derives one application per sampled view:
/// same job and user, applied 5 minutes to 5 days later, weighted status.
/// Stops once the target count is reached; the rest of the sample is left
/// unread.
pub fn seed_applications(db: &mut Database, target: u64, batch_size: usize) -> Result<u64> {
    db.ensure_rows("job_views", "Seed views before applications.")?;
    let mut scan = TableScan::new(db.open_reader()?, VIEW_SAMPLE_SQL, batch_size, view_source_row);

    let mut rng = rand::thread_rng();
    let mut writer =
        BatchWriter::new(&mut db.conn, "applications", target, batch_size, insert_applications);
    loop {
        let batch = scan.fetch_batch()?;
        if batch.is_empty() {
            break;
        }
        for view in batch {
            writer.push(NewApplication {
                job_id: view.job_id,
                user_id: view.user_id,
                applied_at: sample::after(
                    &mut rng,
                    view.viewed_at,
                    MIN_APPLY_DELAY_SECS,
                    MAX_APPLY_DELAY_SECS,
                ),
                status: fake::application_status(&mut rng),
            })?;
        }
        if writer.written() + writer.buffered() as u64 >= target {
            break;
        }
    }
    Ok(writer.finish()?.written)
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryStats {
    pub jobs: u64,
    pub events: u64,
}

/// Streams every job and emits its status trail.
pub fn seed_history(db: &mut Database, batch_size: usize) -> Result<HistoryStats> {
    db.ensure_rows("jobs", "Seed jobs before status history.")?;
    let mut scan = TableScan::new(db.open_reader()?, JOB_SCAN_SQL, batch_size, job_lifetime_row);

    let mut rng = rand::thread_rng();
    let mut writer =
        BatchWriter::new(&mut db.conn, "history events", 0, batch_size, insert_history);
    let mut jobs = 0u64;
    loop {
        let batch = scan.fetch_batch()?;
        if batch.is_empty() {
            break;
        }
        for job in batch {
            jobs += 1;
            for event in status_sequence(&mut rng, &job) {
                writer.push(event)?;
            }
        }
    }
    let events = writer.finish()?.written;
    Ok(HistoryStats { jobs, events })
}

/// Walks one job's lifetime into an ordered status trail: it opens with
/// `active` at posting; jobs that lived at least a day may pick up 0-2
/// pause/resume cycles spread over equal steps of the lifespan; inactive
/// jobs always end with `closed` at `last_updated`. The closing timestamp
/// is authoritative, not derived from the step schedule, so with two
/// pauses it can land before the last scheduled step. Known quirk of the
/// dataset, kept as-is.
pub fn status_sequence(rng: &mut impl Rng, job: &JobLifetime) -> Vec<StatusEvent> {
    let mut events = vec![StatusEvent {
        job_id: job.job_id,
        status: "active",
        changed_at: job.posted_at,
    }];

    let lifespan = (job.last_updated - job.posted_at).num_seconds();
    if lifespan < MIN_CHURN_LIFESPAN_SECS {
        if !job.is_active {
            events.push(StatusEvent {
                job_id: job.job_id,
                status: "closed",
                changed_at: job.last_updated,
            });
        }
        return events;
    }

    // 0, 1 or 2 pause cycles, weighted 10/60/30
    let roll = rng.gen_range(0.0..1.0);
    let num_pauses: i64 = if roll < 0.1 {
        0
    } else if roll < 0.7 {
        1
    } else {
        2
    };

    let step = lifespan / (num_pauses * 2 + 2);
    let mut cursor = job.posted_at;
    for _ in 0..num_pauses {
        cursor = cursor + Duration::seconds(step);
        events.push(StatusEvent {
            job_id: job.job_id,
            status: "paused",
            changed_at: cursor,
        });
        cursor = cursor + Duration::seconds(step);
        events.push(StatusEvent {
            job_id: job.job_id,
            status: "active",
            changed_at: cursor,
        });
    }

    if !job.is_active {
        events.push(StatusEvent {
            job_id: job.job_id,
            status: "closed",
            changed_at: job.last_updated,
        });
    }
    events
}

fn now_secs() -> NaiveDateTime {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_else(|| now.naive_utc())
}

// --- per-table bulk inserts (one prepared statement per chunk) ---

fn insert_companies(tx: &Transaction, rows: &[NewCompany]) -> Result<()> {
    let mut stmt =
        tx.prepare_cached("INSERT INTO companies (name, industry, country) VALUES (?1, ?2, ?3)")?;
    for c in rows {
        stmt.execute(params![c.name, c.industry, c.country])?;
    }
    Ok(())
}

fn insert_jobs(tx: &Transaction, rows: &[NewJob]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO jobs (company_id, title, category, location, salary_from, salary_to, \
         posted_at, is_active, last_updated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for j in rows {
        stmt.execute(params![
            j.company_id,
            j.title,
            j.category,
            j.location,
            j.salary_from,
            j.salary_to,
            j.posted_at,
            j.is_active,
            j.last_updated,
        ])?;
    }
    Ok(())
}

fn insert_views(tx: &Transaction, rows: &[NewView]) -> Result<()> {
    let mut stmt = tx
        .prepare_cached("INSERT INTO job_views (job_id, user_id, viewed_at) VALUES (?1, ?2, ?3)")?;
    for v in rows {
        stmt.execute(params![v.job_id, v.user_id, v.viewed_at])?;
    }
    Ok(())
}

fn insert_applications(tx: &Transaction, rows: &[NewApplication]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO job_applications (job_id, user_id, applied_at, status) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for a in rows {
        stmt.execute(params![a.job_id, a.user_id, a.applied_at, a.status])?;
    }
    Ok(())
}

fn insert_history(tx: &Transaction, rows: &[StatusEvent]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO job_status_history (job_id, status, changed_at) VALUES (?1, ?2, ?3)",
    )?;
    for e in rows {
        stmt.execute(params![e.job_id, e.status, e.changed_at])?;
    }
    Ok(())
}

// --- scan row mappers (column 0 is the rowid keyset) ---

fn view_source_row(row: &Row) -> rusqlite::Result<NewView> {
    Ok(NewView {
        job_id: row.get(1)?,
        user_id: row.get(2)?,
        viewed_at: row.get(3)?,
    })
}

fn job_lifetime_row(row: &Row) -> rusqlite::Result<JobLifetime> {
    Ok(JobLifetime {
        job_id: row.get(1)?,
        posted_at: row.get(2)?,
        last_updated: row.get(3)?,
        is_active: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn lifetime(posted: NaiveDateTime, updated: NaiveDateTime, is_active: bool) -> JobLifetime {
        JobLifetime {
            job_id: 42,
            posted_at: posted,
            last_updated: updated,
            is_active,
        }
    }

    fn fixture() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("seed.db"),
        };
        let db = Database::open(&config).unwrap();
        db.init().unwrap();
        (dir, db)
    }

    fn seed_base(db: &mut Database, jobs: u64, views: u64) {
        seed_companies(db, 3, 10).unwrap();
        seed_jobs(db, jobs, 25).unwrap();
        seed_views(db, views, 100).unwrap();
    }

    // --- status sequencer ---

    #[test]
    fn test_sequence_opens_active_at_posting() {
        let mut rng = StdRng::seed_from_u64(20);
        for is_active in [true, false] {
            let job = lifetime(dt(1, 0), dt(20, 0), is_active);
            let events = status_sequence(&mut rng, &job);
            assert_eq!(events[0].status, "active");
            assert_eq!(events[0].changed_at, job.posted_at);
        }
    }

    #[test]
    fn test_short_lived_active_job_has_single_event() {
        let mut rng = StdRng::seed_from_u64(21);
        let job = lifetime(dt(1, 0), dt(1, 20), true);
        let events = status_sequence(&mut rng, &job);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, "active");
    }

    #[test]
    fn test_short_lived_inactive_job_closes_at_last_updated() {
        let mut rng = StdRng::seed_from_u64(22);
        let job = lifetime(dt(1, 0), dt(1, 20), false);
        let events = status_sequence(&mut rng, &job);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].status, "closed");
        assert_eq!(events[1].changed_at, job.last_updated);
    }

    #[test]
    fn test_inactive_job_always_ends_closed_at_last_updated() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..200 {
            let job = lifetime(dt(1, 0), dt(25, 0), false);
            let events = status_sequence(&mut rng, &job);
            let last = events.last().unwrap();
            assert_eq!(last.status, "closed");
            assert_eq!(last.changed_at, job.last_updated);
        }
    }

    #[test]
    fn test_active_job_alternates_and_ends_active() {
        let mut rng = StdRng::seed_from_u64(24);
        for _ in 0..200 {
            let job = lifetime(dt(1, 0), dt(25, 0), true);
            let events = status_sequence(&mut rng, &job);
            assert!(matches!(events.len(), 1 | 3 | 5));
            for (i, event) in events.iter().enumerate() {
                let expected = if i % 2 == 0 { "active" } else { "paused" };
                assert_eq!(event.status, expected);
            }
            // pause/resume steps never escape the lifespan
            for pair in events.windows(2) {
                assert!(pair[0].changed_at < pair[1].changed_at);
            }
            assert!(events.last().unwrap().changed_at <= job.last_updated);
        }
    }

    // --- phases against a real database ---

    #[test]
    fn test_seed_companies_persists_count() {
        let (_dir, mut db) = fixture();
        let written = seed_companies(&mut db, 25, 10).unwrap();
        assert_eq!(written, 25);
        assert_eq!(db.count("companies").unwrap(), 25);
    }

    #[test]
    fn test_seed_jobs_requires_companies() {
        let (_dir, mut db) = fixture();
        let err = seed_jobs(&mut db, 10, 5).unwrap_err();
        assert!(err.to_string().contains("companies"));
    }

    #[test]
    fn test_seed_jobs_dates_and_salaries() {
        let (_dir, mut db) = fixture();
        seed_companies(&mut db, 3, 10).unwrap();
        seed_jobs(&mut db, 200, 50).unwrap();

        let mut stmt = db
            .conn
            .prepare("SELECT posted_at, last_updated, salary_from, salary_to FROM jobs")
            .unwrap();
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, NaiveDateTime>(0)?,
                    row.get::<_, NaiveDateTime>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows.len(), 200);

        for (posted_at, last_updated, salary_from, salary_to) in rows {
            assert!(last_updated >= posted_at);
            match (salary_from, salary_to) {
                (None, None) => {}
                (Some(from), Some(to)) => assert!(to > from),
                other => panic!("half-set salary pair: {:?}", other),
            }
        }
    }

    #[test]
    fn test_seed_views_respect_posting_dates() {
        let (_dir, mut db) = fixture();
        seed_base(&mut db, 50, 500);
        assert_eq!(db.count("job_views").unwrap(), 500);

        let mut stmt = db
            .conn
            .prepare(
                "SELECT v.viewed_at, j.posted_at FROM job_views v \
                 JOIN jobs j ON j.job_id = v.job_id",
            )
            .unwrap();
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, NaiveDateTime>(0)?,
                    row.get::<_, NaiveDateTime>(1)?,
                ))
            })
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows.len(), 500);
        for (viewed_at, posted_at) in rows {
            assert!(viewed_at >= posted_at);
        }
    }

    #[test]
    fn test_seed_views_requires_jobs() {
        let (_dir, mut db) = fixture();
        seed_companies(&mut db, 2, 10).unwrap();
        assert!(seed_views(&mut db, 10, 5).is_err());
    }

    #[test]
    fn test_applications_derive_from_views() {
        let (_dir, mut db) = fixture();
        seed_base(&mut db, 20, 400);
        let written = seed_applications(&mut db, 10_000, 50).unwrap();
        // ~10% of views get sampled; all of them fit under the target
        assert!(written > 0, "sample of 400 views should yield applications");

        let apps = {
            let mut stmt = db
                .conn
                .prepare("SELECT job_id, user_id, applied_at, status FROM job_applications")
                .unwrap();
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, NaiveDateTime>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .unwrap();
            rows.collect::<Result<Vec<_>, _>>().unwrap()
        };
        assert_eq!(apps.len() as u64, written);

        let views: HashMap<(i64, i64), Vec<NaiveDateTime>> = {
            let mut stmt = db
                .conn
                .prepare("SELECT job_id, user_id, viewed_at FROM job_views")
                .unwrap();
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get(2)?))
                })
                .unwrap();
            let mut map: HashMap<(i64, i64), Vec<NaiveDateTime>> = HashMap::new();
            for row in rows {
                let (job_id, user_id, viewed_at) = row.unwrap();
                map.entry((job_id, user_id)).or_default().push(viewed_at);
            }
            map
        };

        for (job_id, user_id, applied_at, status) in apps {
            assert!(["applied", "rejected", "hired"].contains(&status.unwrap().as_str()));
            let candidates = views
                .get(&(job_id, user_id))
                .expect("application without a source view");
            let in_window = candidates.iter().any(|viewed_at| {
                let delay = (applied_at - *viewed_at).num_seconds();
                (MIN_APPLY_DELAY_SECS..=MAX_APPLY_DELAY_SECS).contains(&delay)
            });
            assert!(in_window, "application outside the 5min-5day window");
        }
    }

    #[test]
    fn test_applications_stop_near_target() {
        let (_dir, mut db) = fixture();
        seed_base(&mut db, 20, 2000);
        let written = seed_applications(&mut db, 10, 5).unwrap();
        // target plus at most one read batch of overshoot
        assert!(written >= 10 && written <= 20, "written = {}", written);
    }

    #[test]
    fn test_history_covers_every_job() {
        let (_dir, mut db) = fixture();
        seed_companies(&mut db, 2, 10).unwrap();
        seed_jobs(&mut db, 30, 10).unwrap();
        let stats = seed_history(&mut db, 10).unwrap();
        assert_eq!(stats.jobs, 30);
        assert!(stats.events >= 30, "every job opens with an active event");
        assert_eq!(db.count("job_status_history").unwrap(), stats.events);

        // first event per job is 'active' at posted_at
        let mismatches: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM jobs j WHERE NOT EXISTS (\
                     SELECT 1 FROM job_status_history h \
                     WHERE h.job_id = j.job_id AND h.status = 'active' \
                       AND h.changed_at = j.posted_at)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(mismatches, 0);

        // inactive jobs end closed at last_updated
        let unclosed: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM jobs j WHERE j.is_active = 0 AND NOT EXISTS (\
                     SELECT 1 FROM job_status_history h \
                     WHERE h.job_id = j.job_id AND h.status = 'closed' \
                       AND h.changed_at = j.last_updated)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unclosed, 0);
    }
}
