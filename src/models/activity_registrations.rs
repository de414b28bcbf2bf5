use chrono::{DateTime, Utc};
use serde::Serialize;

pub const REG_STATUS_CONFIRMED: &str = "confirmed";
pub const REG_STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityRegistrationsRow {
    pub registration_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub registration_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
