use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NewCompany {
    pub name: String,
    pub industry: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub company_id: i64,
    pub title: String,
    pub category: String,
    pub location: String,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub posted_at: NaiveDateTime,
    pub is_active: bool,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewView {
    pub job_id: i64,
    pub user_id: i64,
    pub viewed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_id: i64,
    pub user_id: i64,
    pub applied_at: NaiveDateTime,
    pub status: &'static str, // "applied", "rejected", "hired"
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    pub job_id: i64,
    pub status: &'static str, // "active", "paused", "closed"
    pub changed_at: NaiveDateTime,
}

/// Slice of a job row that the status history sequencer works from.
#[derive(Debug, Clone)]
pub struct JobLifetime {
    pub job_id: i64,
    pub posted_at: NaiveDateTime,
    pub last_updated: NaiveDateTime,
    pub is_active: bool,
}
