use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::ActivityRegistrationsRow;

/// Registration plus the activity (and its organizer handle) for the
/// "my registrations" listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationWithActivityRow {
    pub registration_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub registration_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub activity_title: String,
    pub activity_description: Option<String>,
    pub activity_location: Option<String>,
    pub activity_start_time: DateTime<Utc>,
    pub activity_end_time: DateTime<Utc>,
    pub activity_max_participants: i64,
    pub activity_current_participants: i64,
    pub activity_price: f64,
    pub activity_status: String,
    pub organizer_id: String,
    pub organizer_username: String,
}

/// Registration plus the registrant handle for the per-activity listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationWithUserRow {
    pub registration_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub registration_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCountRow {
    pub status: String,
    pub count: i64,
}

const SQL_FIND_BY_USER_ACTIVITY: &str = r#"
SELECT registration_id, user_id, activity_id, status, registration_time, notes,
       created_at, updated_at
FROM activity_registrations
WHERE user_id = ? AND activity_id = ?
LIMIT 1
"#;

pub async fn find_by_user_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> sqlx::Result<Option<ActivityRegistrationsRow>> {
    sqlx::query_as::<_, ActivityRegistrationsRow>(SQL_FIND_BY_USER_ACTIVITY)
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT: &str = r#"
INSERT INTO activity_registrations (
  registration_id,
  user_id,
  activity_id,
  status,
  registration_time,
  notes,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub async fn insert_registration(
    conn: &mut SqliteConnection,
    row: &ActivityRegistrationsRow,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT)
        .bind(&row.registration_id)
        .bind(&row.user_id)
        .bind(&row.activity_id)
        .bind(&row.status)
        .bind(row.registration_time)
        .bind(&row.notes)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

// Conditional flip so two racing cancels cannot both decrement the counter.
const SQL_CANCEL: &str = r#"
UPDATE activity_registrations
SET status = 'cancelled',
    updated_at = ?
WHERE registration_id = ?
  AND status <> 'cancelled'
"#;

pub async fn cancel_registration(
    conn: &mut SqliteConnection,
    registration_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CANCEL)
        .bind(now)
        .bind(registration_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FOR_USER: &str = r#"
SELECT
  r.registration_id,
  r.user_id,
  r.activity_id,
  r.status,
  r.registration_time,
  r.notes,
  a.title AS activity_title,
  a.description AS activity_description,
  a.location AS activity_location,
  a.start_time AS activity_start_time,
  a.end_time AS activity_end_time,
  a.max_participants AS activity_max_participants,
  a.current_participants AS activity_current_participants,
  a.price AS activity_price,
  a.status AS activity_status,
  a.organizer_id,
  u.username AS organizer_username
FROM activity_registrations r
JOIN activities a ON a.activity_id = r.activity_id
JOIN users u ON u.user_id = a.organizer_id
WHERE r.user_id = ?
  AND (? IS NULL OR r.status = ?)
ORDER BY r.registration_time DESC
LIMIT ? OFFSET ?
"#;

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<RegistrationWithActivityRow>> {
    sqlx::query_as::<_, RegistrationWithActivityRow>(SQL_LIST_FOR_USER)
        .bind(user_id)
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_LIST_FOR_ACTIVITY: &str = r#"
SELECT
  r.registration_id,
  r.user_id,
  r.activity_id,
  r.status,
  r.registration_time,
  r.notes,
  u.username
FROM activity_registrations r
JOIN users u ON u.user_id = r.user_id
WHERE r.activity_id = ?
  AND (? IS NULL OR r.status = ?)
ORDER BY r.registration_time ASC
LIMIT ? OFFSET ?
"#;

pub async fn list_for_activity(
    pool: &SqlitePool,
    activity_id: &str,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<RegistrationWithUserRow>> {
    sqlx::query_as::<_, RegistrationWithUserRow>(SQL_LIST_FOR_ACTIVITY)
        .bind(activity_id)
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_STATS: &str = r#"
SELECT status, COUNT(*) AS count
FROM activity_registrations
WHERE activity_id = ?
GROUP BY status
"#;

pub async fn stats_by_status(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Vec<StatusCountRow>> {
    sqlx::query_as::<_, StatusCountRow>(SQL_STATS)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}
