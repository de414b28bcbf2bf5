use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::activity_repo::{
    self, ActivitySearchFilter, ActivityUpdate, ActivityWithOrganizerRow, NewActivity,
};
use crate::error::Error;
use crate::models::activities::{ACTIVITY_STATUSES, STATUS_DRAFT};
use crate::models::UserRef;
use crate::services::{page_window, total_pages};

#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: i64,
    pub current_participants: i64,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub organizer: UserRef,
}

#[derive(Debug, Serialize)]
pub struct ActivityPageView {
    pub activities: Vec<ActivityView>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug)]
pub struct NewActivityInput {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: i64,
    pub price: f64,
    pub status: Option<String>,
}

/// All fields optional; absent fields keep their current value.
#[derive(Debug, Default)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_participants: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Default)]
pub struct ActivitySearchParams {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub organizer_id: Option<String>,
}

fn to_view(row: ActivityWithOrganizerRow) -> ActivityView {
    ActivityView {
        id: row.activity_id,
        title: row.title,
        description: row.description,
        location: row.location,
        start_time: row.start_time,
        end_time: row.end_time,
        max_participants: row.max_participants,
        current_participants: row.current_participants,
        price: row.price,
        status: row.status,
        created_at: row.created_at,
        organizer: UserRef {
            id: row.organizer_id,
            username: row.organizer_username,
        },
    }
}

fn validate_status(status: &str) -> Result<(), Error> {
    if !ACTIVITY_STATUSES.contains(&status) {
        return Err(Error::InvalidArgument(format!(
            "unknown activity status: {}",
            status
        )));
    }
    Ok(())
}

fn validate_numbers(max_participants: i64, price: f64) -> Result<(), Error> {
    if max_participants < 0 {
        return Err(Error::InvalidArgument(
            "max_participants must not be negative".into(),
        ));
    }
    if price < 0.0 {
        return Err(Error::InvalidArgument("price must not be negative".into()));
    }
    Ok(())
}

pub async fn create(
    pool: &SqlitePool,
    organizer_id: &str,
    input: NewActivityInput,
) -> Result<ActivityView, Error> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title is required".into()));
    }
    let status = input.status.as_deref().unwrap_or(STATUS_DRAFT);
    validate_status(status)?;
    validate_numbers(input.max_participants, input.price)?;

    let activity_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    activity_repo::insert_activity(
        pool,
        NewActivity {
            activity_id: &activity_id,
            title,
            description: input.description.as_deref(),
            location: input.location.as_deref(),
            start_time: input.start_time,
            end_time: input.end_time,
            max_participants: input.max_participants,
            price: input.price,
            status,
            organizer_id,
            now,
        },
    )
    .await?;
    get(pool, &activity_id).await
}

pub async fn get(pool: &SqlitePool, activity_id: &str) -> Result<ActivityView, Error> {
    let row = activity_repo::find_with_organizer(pool, activity_id)
        .await?
        .ok_or(Error::NotFound("activity not found"))?;
    Ok(to_view(row))
}

/// Owner-only partial update. The participant counter is not reachable from
/// here: only the registration ledger writes it.
pub async fn update(
    pool: &SqlitePool,
    activity_id: &str,
    organizer_id: &str,
    patch: ActivityPatch,
) -> Result<ActivityView, Error> {
    let current = activity_repo::find_by_id(pool, activity_id)
        .await?
        .ok_or(Error::NotFound("activity not found"))?;
    if current.organizer_id != organizer_id {
        return Err(Error::Forbidden("not allowed to modify this activity"));
    }

    let title = patch.title.unwrap_or(current.title);
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title is required".into()));
    }
    let status = patch.status.unwrap_or(current.status);
    validate_status(&status)?;
    let max_participants = patch.max_participants.unwrap_or(current.max_participants);
    let price = patch.price.unwrap_or(current.price);
    validate_numbers(max_participants, price)?;
    let description = patch.description.or(current.description);
    let location = patch.location.or(current.location);

    activity_repo::update_activity(
        pool,
        activity_id,
        ActivityUpdate {
            title,
            description: description.as_deref(),
            location: location.as_deref(),
            start_time: patch.start_time.unwrap_or(current.start_time),
            end_time: patch.end_time.unwrap_or(current.end_time),
            max_participants,
            price,
            status: &status,
            now: Utc::now(),
        },
    )
    .await?;
    get(pool, activity_id).await
}

pub async fn delete(
    pool: &SqlitePool,
    activity_id: &str,
    organizer_id: &str,
) -> Result<(), Error> {
    let current = activity_repo::find_by_id(pool, activity_id)
        .await?
        .ok_or(Error::NotFound("activity not found"))?;
    if current.organizer_id != organizer_id {
        return Err(Error::Forbidden("not allowed to delete this activity"));
    }
    activity_repo::delete_activity(pool, activity_id).await?;
    Ok(())
}

pub async fn list(
    pool: &SqlitePool,
    page: i64,
    page_size: i64,
    status: Option<&str>,
) -> Result<ActivityPageView, Error> {
    let (limit, offset) = page_window(page, page_size);
    let total = activity_repo::count(pool, status).await?;
    let rows = activity_repo::list(pool, status, limit, offset).await?;
    Ok(ActivityPageView {
        activities: rows.into_iter().map(to_view).collect(),
        total,
        page: page.max(1),
        total_pages: total_pages(total, limit),
    })
}

pub async fn list_for_organizer(
    pool: &SqlitePool,
    organizer_id: &str,
    page: i64,
    page_size: i64,
) -> Result<ActivityPageView, Error> {
    let (limit, offset) = page_window(page, page_size);
    let total = activity_repo::count_by_organizer(pool, organizer_id).await?;
    let rows = activity_repo::list_by_organizer(pool, organizer_id, limit, offset).await?;
    Ok(ActivityPageView {
        activities: rows.into_iter().map(to_view).collect(),
        total,
        page: page.max(1),
        total_pages: total_pages(total, limit),
    })
}

pub async fn search(
    pool: &SqlitePool,
    params: &ActivitySearchParams,
    page: i64,
    page_size: i64,
) -> Result<ActivityPageView, Error> {
    let (limit, offset) = page_window(page, page_size);
    let filter = ActivitySearchFilter {
        keyword: params.keyword.as_deref(),
        status: params.status.as_deref(),
        start_after: params.start_date,
        end_before: params.end_date,
        min_price: params.min_price,
        max_price: params.max_price,
        organizer_id: params.organizer_id.as_deref(),
    };
    let total = activity_repo::search_count(pool, &filter).await?;
    let rows = activity_repo::search(pool, &filter, limit, offset).await?;
    Ok(ActivityPageView {
        activities: rows.into_iter().map(to_view).collect(),
        total,
        page: page.max(1),
        total_pages: total_pages(total, limit),
    })
}

pub async fn popular(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityView>, Error> {
    let rows = activity_repo::list_popular(pool, limit.max(1)).await?;
    Ok(rows.into_iter().map(to_view).collect())
}

pub async fn upcoming(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityView>, Error> {
    let rows = activity_repo::list_upcoming(pool, Utc::now(), limit.max(1)).await?;
    Ok(rows.into_iter().map(to_view).collect())
}
