use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::ActivitiesRow;

/// Activity plus the organizer handle for API embeds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityWithOrganizerRow {
    pub activity_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: i64,
    pub current_participants: i64,
    pub price: f64,
    pub status: String,
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organizer_username: String,
}

pub struct NewActivity<'a> {
    pub activity_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: i64,
    pub price: f64,
    pub status: &'a str,
    pub organizer_id: &'a str,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActivitySearchFilter<'a> {
    pub keyword: Option<&'a str>,
    pub status: Option<&'a str>,
    pub start_after: Option<DateTime<Utc>>,
    pub end_before: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub organizer_id: Option<&'a str>,
}

const SQL_INSERT: &str = r#"
INSERT INTO activities (
  activity_id,
  title,
  description,
  location,
  start_time,
  end_time,
  max_participants,
  current_participants,
  price,
  status,
  organizer_id,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
"#;

pub async fn insert_activity(pool: &SqlitePool, activity: NewActivity<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT)
        .bind(activity.activity_id)
        .bind(activity.title)
        .bind(activity.description)
        .bind(activity.location)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.max_participants)
        .bind(activity.price)
        .bind(activity.status)
        .bind(activity.organizer_id)
        .bind(activity.now)
        .bind(activity.now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_FIND_BY_ID: &str = r#"
SELECT
  activity_id,
  title,
  description,
  location,
  start_time,
  end_time,
  max_participants,
  current_participants,
  price,
  status,
  organizer_id,
  created_at,
  updated_at
FROM activities
WHERE activity_id = ?
LIMIT 1
"#;

pub async fn find_by_id(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<Option<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_FIND_BY_ID)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

const SQL_FIND_WITH_ORGANIZER: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE a.activity_id = ?
LIMIT 1
"#;

pub async fn find_with_organizer(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Option<ActivityWithOrganizerRow>> {
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_FIND_WITH_ORGANIZER)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE (? IS NULL OR a.status = ?)
ORDER BY a.created_at DESC
LIMIT ? OFFSET ?
"#;

pub async fn list(
    pool: &SqlitePool,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ActivityWithOrganizerRow>> {
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_LIST)
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_COUNT: &str = r#"
SELECT COUNT(*) FROM activities WHERE (? IS NULL OR status = ?)
"#;

pub async fn count(pool: &SqlitePool, status: Option<&str>) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT)
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
}

const SQL_LIST_BY_ORGANIZER: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE a.organizer_id = ?
ORDER BY a.created_at DESC
LIMIT ? OFFSET ?
"#;

pub async fn list_by_organizer(
    pool: &SqlitePool,
    organizer_id: &str,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ActivityWithOrganizerRow>> {
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_LIST_BY_ORGANIZER)
        .bind(organizer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_COUNT_BY_ORGANIZER: &str = r#"
SELECT COUNT(*) FROM activities WHERE organizer_id = ?
"#;

pub async fn count_by_organizer(pool: &SqlitePool, organizer_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_BY_ORGANIZER)
        .bind(organizer_id)
        .fetch_one(pool)
        .await
}

const SQL_SEARCH: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE (? IS NULL OR a.title LIKE ? OR a.description LIKE ? OR a.location LIKE ?)
  AND (? IS NULL OR a.status = ?)
  AND (? IS NULL OR a.start_time >= ?)
  AND (? IS NULL OR a.end_time <= ?)
  AND (? IS NULL OR a.price >= ?)
  AND (? IS NULL OR a.price <= ?)
  AND (? IS NULL OR a.organizer_id = ?)
ORDER BY a.created_at DESC
LIMIT ? OFFSET ?
"#;

const SQL_SEARCH_COUNT: &str = r#"
SELECT COUNT(*)
FROM activities a
WHERE (? IS NULL OR a.title LIKE ? OR a.description LIKE ? OR a.location LIKE ?)
  AND (? IS NULL OR a.status = ?)
  AND (? IS NULL OR a.start_time >= ?)
  AND (? IS NULL OR a.end_time <= ?)
  AND (? IS NULL OR a.price >= ?)
  AND (? IS NULL OR a.price <= ?)
  AND (? IS NULL OR a.organizer_id = ?)
"#;

fn keyword_like(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| format!("%{}%", k))
}

pub async fn search(
    pool: &SqlitePool,
    filter: &ActivitySearchFilter<'_>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ActivityWithOrganizerRow>> {
    let like = keyword_like(filter.keyword);
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_SEARCH)
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.start_after)
        .bind(filter.start_after)
        .bind(filter.end_before)
        .bind(filter.end_before)
        .bind(filter.min_price)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.max_price)
        .bind(filter.organizer_id)
        .bind(filter.organizer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn search_count(
    pool: &SqlitePool,
    filter: &ActivitySearchFilter<'_>,
) -> sqlx::Result<i64> {
    let like = keyword_like(filter.keyword);
    sqlx::query_scalar::<_, i64>(SQL_SEARCH_COUNT)
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.start_after)
        .bind(filter.start_after)
        .bind(filter.end_before)
        .bind(filter.end_before)
        .bind(filter.min_price)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.max_price)
        .bind(filter.organizer_id)
        .bind(filter.organizer_id)
        .fetch_one(pool)
        .await
}

const SQL_LIST_POPULAR: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE a.status = 'published'
ORDER BY a.current_participants DESC
LIMIT ?
"#;

pub async fn list_popular(
    pool: &SqlitePool,
    limit: i64,
) -> sqlx::Result<Vec<ActivityWithOrganizerRow>> {
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_LIST_POPULAR)
        .bind(limit)
        .fetch_all(pool)
        .await
}

const SQL_LIST_UPCOMING: &str = r#"
SELECT
  a.activity_id,
  a.title,
  a.description,
  a.location,
  a.start_time,
  a.end_time,
  a.max_participants,
  a.current_participants,
  a.price,
  a.status,
  a.organizer_id,
  a.created_at,
  a.updated_at,
  u.username AS organizer_username
FROM activities a
JOIN users u ON u.user_id = a.organizer_id
WHERE a.status = 'published'
  AND a.start_time > ?
ORDER BY a.start_time ASC
LIMIT ?
"#;

pub async fn list_upcoming(
    pool: &SqlitePool,
    after: DateTime<Utc>,
    limit: i64,
) -> sqlx::Result<Vec<ActivityWithOrganizerRow>> {
    sqlx::query_as::<_, ActivityWithOrganizerRow>(SQL_LIST_UPCOMING)
        .bind(after)
        .bind(limit)
        .fetch_all(pool)
        .await
}

// current_participants is deliberately absent: only the registration ledger
// may touch the counter.
const SQL_UPDATE: &str = r#"
UPDATE activities SET
  title = ?,
  description = ?,
  location = ?,
  start_time = ?,
  end_time = ?,
  max_participants = ?,
  price = ?,
  status = ?,
  updated_at = ?
WHERE activity_id = ?
"#;

pub struct ActivityUpdate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: i64,
    pub price: f64,
    pub status: &'a str,
    pub now: DateTime<Utc>,
}

pub async fn update_activity(
    pool: &SqlitePool,
    activity_id: &str,
    update: ActivityUpdate<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE)
        .bind(update.title)
        .bind(update.description)
        .bind(update.location)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(update.max_participants)
        .bind(update.price)
        .bind(update.status)
        .bind(update.now)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE: &str = r#"
DELETE FROM activities WHERE activity_id = ?
"#;

pub async fn delete_activity(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// Conditional seat claim: the capacity check and the increment are one
// statement, so concurrent registrations can never push the counter past
// max_participants. Zero rows affected means the claim lost.
const SQL_CLAIM_SEAT: &str = r#"
UPDATE activities
SET current_participants = current_participants + 1,
    updated_at = ?
WHERE activity_id = ?
  AND status = 'published'
  AND current_participants < max_participants
"#;

pub async fn claim_seat(
    conn: &mut SqliteConnection,
    activity_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CLAIM_SEAT)
        .bind(now)
        .bind(activity_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

// Decrement floored at zero; drifted counters must never go negative.
const SQL_RELEASE_SEAT: &str = r#"
UPDATE activities
SET current_participants = max(current_participants - 1, 0),
    updated_at = ?
WHERE activity_id = ?
"#;

pub async fn release_seat(
    conn: &mut SqliteConnection,
    activity_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_RELEASE_SEAT)
        .bind(now)
        .bind(activity_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
