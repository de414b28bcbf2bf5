#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use sporthub::database::{activity_repo, schema, user_repo};

pub struct TestDb {
    pub pool: SqlitePool,
    // Held so the database file outlives the pool.
    _dir: tempfile::TempDir,
}

/// File-backed database in WAL mode: `:memory:` databases are
/// per-connection, and the registration race tests need real concurrent
/// writers on one database.
pub async fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("connect test db");
    schema::apply(&pool).await.expect("apply schema");
    TestDb { pool, _dir: dir }
}

/// Seeds through the repo with a fixed fake hash: bcrypt cost would dominate
/// the suite, and only the auth tests care about real hashes.
pub async fn seed_user(pool: &SqlitePool, username: &str) -> String {
    let user_id = Uuid::new_v4().to_string();
    user_repo::insert_user(
        pool,
        user_repo::NewUser {
            user_id: &user_id,
            username,
            password_hash: "not-a-real-hash",
            now: Utc::now(),
        },
    )
    .await
    .expect("insert user");
    user_id
}

pub async fn seed_activity(
    pool: &SqlitePool,
    organizer_id: &str,
    status: &str,
    max_participants: i64,
) -> String {
    let start = Utc::now() + Duration::days(3);
    seed_activity_starting(pool, organizer_id, status, max_participants, start).await
}

pub async fn seed_activity_starting(
    pool: &SqlitePool,
    organizer_id: &str,
    status: &str,
    max_participants: i64,
    start_time: DateTime<Utc>,
) -> String {
    let activity_id = Uuid::new_v4().to_string();
    activity_repo::insert_activity(
        pool,
        activity_repo::NewActivity {
            activity_id: &activity_id,
            title: "Sunday five-a-side",
            description: Some("Friendly match, all levels welcome"),
            location: Some("City park pitch 2"),
            start_time,
            end_time: start_time + Duration::hours(2),
            max_participants,
            price: 5.0,
            status,
            organizer_id,
            now: Utc::now(),
        },
    )
    .await
    .expect("insert activity");
    activity_id
}
