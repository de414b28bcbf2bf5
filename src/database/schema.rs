use sqlx::SqlitePool;

// Startup DDL. Idempotent so it can run on every boot and in tests.

const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  user_id        TEXT PRIMARY KEY,
  username       TEXT NOT NULL UNIQUE,
  password_hash  TEXT NOT NULL,
  created_at     TEXT NOT NULL,
  updated_at     TEXT NOT NULL
)
"#;

const SQL_CREATE_ACTIVITIES: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
  activity_id           TEXT PRIMARY KEY,
  title                 TEXT NOT NULL,
  description           TEXT,
  location              TEXT,
  start_time            TEXT NOT NULL,
  end_time              TEXT NOT NULL,
  max_participants      INTEGER NOT NULL DEFAULT 0,
  current_participants  INTEGER NOT NULL DEFAULT 0,
  price                 REAL NOT NULL DEFAULT 0,
  status                TEXT NOT NULL DEFAULT 'draft',
  organizer_id          TEXT NOT NULL REFERENCES users(user_id),
  created_at            TEXT NOT NULL,
  updated_at            TEXT NOT NULL
)
"#;

// One row per (user, activity), ever. Cancellation flips status in place.
const SQL_CREATE_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS activity_registrations (
  registration_id    TEXT PRIMARY KEY,
  user_id            TEXT NOT NULL REFERENCES users(user_id),
  activity_id        TEXT NOT NULL REFERENCES activities(activity_id),
  status             TEXT NOT NULL DEFAULT 'confirmed',
  registration_time  TEXT NOT NULL,
  notes              TEXT,
  created_at         TEXT NOT NULL,
  updated_at         TEXT NOT NULL,
  UNIQUE (user_id, activity_id)
)
"#;

const SQL_CREATE_COMMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS activity_comments (
  comment_id   TEXT PRIMARY KEY,
  user_id      TEXT NOT NULL REFERENCES users(user_id),
  activity_id  TEXT NOT NULL REFERENCES activities(activity_id),
  content      TEXT NOT NULL,
  rating       INTEGER,
  parent_id    TEXT REFERENCES activity_comments(comment_id),
  created_at   TEXT NOT NULL,
  updated_at   TEXT NOT NULL
)
"#;

const SQL_CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_activities_organizer ON activities(organizer_id)",
    "CREATE INDEX IF NOT EXISTS idx_registrations_activity ON activity_registrations(activity_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_activity ON activity_comments(activity_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_parent ON activity_comments(parent_id)",
];

pub async fn apply(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_CREATE_USERS).execute(pool).await?;
    sqlx::query(SQL_CREATE_ACTIVITIES).execute(pool).await?;
    sqlx::query(SQL_CREATE_REGISTRATIONS).execute(pool).await?;
    sqlx::query(SQL_CREATE_COMMENTS).execute(pool).await?;
    for stmt in SQL_CREATE_INDEXES {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
