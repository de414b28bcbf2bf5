use chrono::{DateTime, Utc};
use serde::Serialize;

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_COMPLETED: &str = "completed";

pub const ACTIVITY_STATUSES: [&str; 4] = [
    STATUS_DRAFT,
    STATUS_PUBLISHED,
    STATUS_CANCELLED,
    STATUS_COMPLETED,
];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivitiesRow {
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
}
