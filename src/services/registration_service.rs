use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, registration_repo};
use crate::error::{is_unique_violation, Error};
use crate::models::activities::STATUS_PUBLISHED;
use crate::models::activity_registrations::{REG_STATUS_CANCELLED, REG_STATUS_CONFIRMED};
use crate::models::{ActivityRegistrationsRow, UserRef};
use crate::services::page_window;

#[derive(Debug, Serialize)]
pub struct RegistrationActivityView {
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
    pub organizer: UserRef,
}

#[derive(Debug, Serialize)]
pub struct RegistrationWithActivityView {
    pub id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub registration_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub activity: RegistrationActivityView,
}

#[derive(Debug, Serialize)]
pub struct RegistrationWithUserView {
    pub id: String,
    pub activity_id: String,
    pub status: String,
    pub registration_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub user: UserRef,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStatsView {
    pub confirmed: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// Register a user for an activity. Precondition failures come back in a
/// fixed order, each as its own error; on success the confirmed row and the
/// counter increment commit together or not at all.
pub async fn register(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    notes: Option<String>,
) -> Result<ActivityRegistrationsRow, Error> {
    let activity = activity_repo::find_by_id(pool, activity_id)
        .await?
        .ok_or(Error::NotFound("activity not found"))?;
    if activity.status != STATUS_PUBLISHED {
        return Err(Error::InvalidState("activity is not open for registration"));
    }
    // Any prior row blocks, cancelled ones included; see DESIGN.md.
    if registration_repo::find_by_user_activity(pool, user_id, activity_id)
        .await?
        .is_some()
    {
        return Err(Error::Conflict("already registered for this activity"));
    }
    if activity.current_participants >= activity.max_participants {
        return Err(Error::Conflict("activity is full"));
    }

    let now = Utc::now();
    let row = ActivityRegistrationsRow {
        registration_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        activity_id: activity_id.to_string(),
        status: REG_STATUS_CONFIRMED.to_string(),
        registration_time: now,
        notes,
        created_at: now,
        updated_at: now,
    };

    // The claim runs first so the transaction opens with a write: competing
    // registrations queue on SQLite's write lock instead of interleaving
    // with the checks above.
    let mut tx = pool.begin().await?;
    if activity_repo::claim_seat(&mut *tx, activity_id, now).await? == 0 {
        tx.rollback().await?;
        // Lost the claim; re-read to report the precise reason.
        let activity = activity_repo::find_by_id(pool, activity_id)
            .await?
            .ok_or(Error::NotFound("activity not found"))?;
        if activity.status != STATUS_PUBLISHED {
            return Err(Error::InvalidState("activity is not open for registration"));
        }
        return Err(Error::Conflict("activity is full"));
    }
    match registration_repo::insert_registration(&mut *tx, &row).await {
        Ok(_) => {}
        // A concurrent request inserted the same (user, activity) pair
        // between our check and now; the rollback undoes the claim.
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            return Err(Error::Conflict("already registered for this activity"));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit().await?;

    Ok(row)
}

/// Cancel a registration: flip the row to cancelled and release the seat,
/// atomically. The counter never goes below zero.
pub async fn cancel(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<ActivityRegistrationsRow, Error> {
    let registration = registration_repo::find_by_user_activity(pool, user_id, activity_id)
        .await?
        .ok_or(Error::NotFound("registration not found"))?;
    if registration.status == REG_STATUS_CANCELLED {
        return Err(Error::InvalidState("registration already cancelled"));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;
    // Conditional flip: when a concurrent cancel got here first this
    // affects zero rows and the decrement must not run again.
    let flipped =
        registration_repo::cancel_registration(&mut *tx, &registration.registration_id, now)
            .await?;
    if flipped == 0 {
        tx.rollback().await?;
        return Err(Error::InvalidState("registration already cancelled"));
    }
    activity_repo::release_seat(&mut *tx, activity_id, now).await?;
    tx.commit().await?;

    Ok(ActivityRegistrationsRow {
        status: REG_STATUS_CANCELLED.to_string(),
        updated_at: now,
        ..registration
    })
}

pub async fn check(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<Option<ActivityRegistrationsRow>, Error> {
    Ok(registration_repo::find_by_user_activity(pool, user_id, activity_id).await?)
}

/// Counts by status. Pure read; organizer-only access is the caller's job.
pub async fn stats(pool: &SqlitePool, activity_id: &str) -> Result<RegistrationStatsView, Error> {
    let rows = registration_repo::stats_by_status(pool, activity_id).await?;
    let mut view = RegistrationStatsView {
        confirmed: 0,
        cancelled: 0,
        total: 0,
    };
    for row in rows {
        match row.status.as_str() {
            REG_STATUS_CONFIRMED => view.confirmed = row.count,
            REG_STATUS_CANCELLED => view.cancelled = row.count,
            _ => {}
        }
        view.total += row.count;
    }
    Ok(view)
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    status: Option<&str>,
    page: i64,
    page_size: i64,
) -> Result<Vec<RegistrationWithActivityView>, Error> {
    let status = status.filter(|s| *s != "all");
    let (limit, offset) = page_window(page, page_size);
    let rows = registration_repo::list_for_user(pool, user_id, status, limit, offset).await?;
    Ok(rows
        .into_iter()
        .map(|r| RegistrationWithActivityView {
            id: r.registration_id,
            user_id: r.user_id,
            activity_id: r.activity_id.clone(),
            status: r.status,
            registration_time: r.registration_time,
            notes: r.notes,
            activity: RegistrationActivityView {
                id: r.activity_id,
                title: r.activity_title,
                description: r.activity_description,
                location: r.activity_location,
                start_time: r.activity_start_time,
                end_time: r.activity_end_time,
                max_participants: r.activity_max_participants,
                current_participants: r.activity_current_participants,
                price: r.activity_price,
                status: r.activity_status,
                organizer: UserRef {
                    id: r.organizer_id,
                    username: r.organizer_username,
                },
            },
        })
        .collect())
}

pub async fn list_for_activity(
    pool: &SqlitePool,
    activity_id: &str,
    status: Option<&str>,
    page: i64,
    page_size: i64,
) -> Result<Vec<RegistrationWithUserView>, Error> {
    let status = status.filter(|s| *s != "all");
    let (limit, offset) = page_window(page, page_size);
    let rows = registration_repo::list_for_activity(pool, activity_id, status, limit, offset).await?;
    Ok(rows
        .into_iter()
        .map(|r| RegistrationWithUserView {
            id: r.registration_id,
            activity_id: r.activity_id,
            status: r.status,
            registration_time: r.registration_time,
            notes: r.notes,
            user: UserRef {
                id: r.user_id,
                username: r.username,
            },
        })
        .collect())
}
