use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::ActivityCommentsRow;

/// Comment plus the author handle.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithUserRow {
    pub comment_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// Comment plus the activity it belongs to, for the per-user listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithActivityRow {
    pub comment_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub activity_title: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingStatsRow {
    pub average_rating: Option<f64>,
    pub total_ratings: i64,
}

const SQL_INSERT: &str = r#"
INSERT INTO activity_comments (
  comment_id,
  user_id,
  activity_id,
  content,
  rating,
  parent_id,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub async fn insert_comment(pool: &SqlitePool, row: &ActivityCommentsRow) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT)
        .bind(&row.comment_id)
        .bind(&row.user_id)
        .bind(&row.activity_id)
        .bind(&row.content)
        .bind(row.rating)
        .bind(&row.parent_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_FIND_BY_ID: &str = r#"
SELECT comment_id, user_id, activity_id, content, rating, parent_id,
       created_at, updated_at
FROM activity_comments
WHERE comment_id = ?
LIMIT 1
"#;

pub async fn find_by_id(
    pool: &SqlitePool,
    comment_id: &str,
) -> sqlx::Result<Option<ActivityCommentsRow>> {
    sqlx::query_as::<_, ActivityCommentsRow>(SQL_FIND_BY_ID)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

const SQL_FIND_WITH_USER: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.parent_id,
  c.created_at,
  u.username
FROM activity_comments c
JOIN users u ON u.user_id = c.user_id
WHERE c.comment_id = ?
LIMIT 1
"#;

pub async fn find_with_user(
    pool: &SqlitePool,
    comment_id: &str,
) -> sqlx::Result<Option<CommentWithUserRow>> {
    sqlx::query_as::<_, CommentWithUserRow>(SQL_FIND_WITH_USER)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_TOP_LEVEL: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.parent_id,
  c.created_at,
  u.username
FROM activity_comments c
JOIN users u ON u.user_id = c.user_id
WHERE c.activity_id = ?
  AND c.parent_id IS NULL
ORDER BY c.created_at DESC
LIMIT ? OFFSET ?
"#;

pub async fn list_top_level(
    pool: &SqlitePool,
    activity_id: &str,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<CommentWithUserRow>> {
    sqlx::query_as::<_, CommentWithUserRow>(SQL_LIST_TOP_LEVEL)
        .bind(activity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_COUNT_TOP_LEVEL: &str = r#"
SELECT COUNT(*) FROM activity_comments WHERE activity_id = ? AND parent_id IS NULL
"#;

pub async fn count_top_level(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_TOP_LEVEL)
        .bind(activity_id)
        .fetch_one(pool)
        .await
}

// Replies for exactly the top-level comments of one page window, in a single
// round trip. The inner select mirrors SQL_LIST_TOP_LEVEL's window.
const SQL_LIST_REPLIES_FOR_WINDOW: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.parent_id,
  c.created_at,
  u.username
FROM activity_comments c
JOIN users u ON u.user_id = c.user_id
WHERE c.parent_id IN (
  SELECT comment_id
  FROM activity_comments
  WHERE activity_id = ?
    AND parent_id IS NULL
  ORDER BY created_at DESC
  LIMIT ? OFFSET ?
)
ORDER BY c.created_at ASC
"#;

pub async fn list_replies_for_window(
    pool: &SqlitePool,
    activity_id: &str,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<CommentWithUserRow>> {
    sqlx::query_as::<_, CommentWithUserRow>(SQL_LIST_REPLIES_FOR_WINDOW)
        .bind(activity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_LIST_REPLIES: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.parent_id,
  c.created_at,
  u.username
FROM activity_comments c
JOIN users u ON u.user_id = c.user_id
WHERE c.parent_id = ?
ORDER BY c.created_at ASC
"#;

pub async fn list_replies(
    pool: &SqlitePool,
    parent_id: &str,
) -> sqlx::Result<Vec<CommentWithUserRow>> {
    sqlx::query_as::<_, CommentWithUserRow>(SQL_LIST_REPLIES)
        .bind(parent_id)
        .fetch_all(pool)
        .await
}

const SQL_UPDATE: &str = r#"
UPDATE activity_comments
SET content = ?,
    rating = ?,
    updated_at = ?
WHERE comment_id = ?
"#;

pub async fn update_comment(
    pool: &SqlitePool,
    comment_id: &str,
    content: &str,
    rating: Option<i64>,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE)
        .bind(content)
        .bind(rating)
        .bind(now)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// One-level cascade: the comment and its direct replies go in one statement.
// Depth is capped at 1 by the write path, so no recursion is needed.
const SQL_DELETE_WITH_REPLIES: &str = r#"
DELETE FROM activity_comments WHERE comment_id = ? OR parent_id = ?
"#;

pub async fn delete_with_replies(pool: &SqlitePool, comment_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_WITH_REPLIES)
        .bind(comment_id)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_RATING_STATS: &str = r#"
SELECT AVG(rating) AS average_rating, COUNT(rating) AS total_ratings
FROM activity_comments
WHERE activity_id = ?
  AND rating IS NOT NULL
"#;

pub async fn rating_stats(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<RatingStatsRow> {
    sqlx::query_as::<_, RatingStatsRow>(SQL_RATING_STATS)
        .bind(activity_id)
        .fetch_one(pool)
        .await
}

const SQL_LIST_FOR_USER: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.parent_id,
  c.created_at,
  a.title AS activity_title
FROM activity_comments c
JOIN activities a ON a.activity_id = c.activity_id
WHERE c.user_id = ?
ORDER BY c.created_at DESC
LIMIT ? OFFSET ?
"#;

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<CommentWithActivityRow>> {
    sqlx::query_as::<_, CommentWithActivityRow>(SQL_LIST_FOR_USER)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_COUNT_FOR_USER: &str = r#"
SELECT COUNT(*) FROM activity_comments WHERE user_id = ?
"#;

pub async fn count_for_user(pool: &SqlitePool, user_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_FOR_USER)
        .bind(user_id)
        .fetch_one(pool)
        .await
}
