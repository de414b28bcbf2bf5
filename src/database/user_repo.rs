use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::UsersRow;

const SQL_FIND_BY_USERNAME: &str = r#"
SELECT user_id, username, password_hash, created_at, updated_at
FROM users
WHERE username = ?
LIMIT 1
"#;

const SQL_FIND_BY_ID: &str = r#"
SELECT user_id, username, password_hash, created_at, updated_at
FROM users
WHERE user_id = ?
LIMIT 1
"#;

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (user_id, username, password_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
"#;

pub struct NewUser<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub now: DateTime<Utc>,
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_FIND_BY_USERNAME)
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_FIND_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(pool: &SqlitePool, user: NewUser<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_USER)
        .bind(user.user_id)
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.now)
        .bind(user.now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
