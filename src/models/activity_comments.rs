use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityCommentsRow {
    pub comment_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
