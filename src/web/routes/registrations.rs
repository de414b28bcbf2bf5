use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::error::Error;
use crate::models::ActivityRegistrationsRow;
use crate::services::registration_service::{
    self, RegistrationStatsView, RegistrationWithActivityView, RegistrationWithUserView,
};
use crate::services::activity_service;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub activity_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RegistrationListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Registration listings and stats are for the activity's organizer only;
/// the ledger itself does not check ownership.
async fn require_organizer(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
) -> Result<(), Error> {
    let activity = activity_service::get(pool, activity_id).await?;
    if activity.organizer.id != user_id {
        return Err(Error::Forbidden(
            "only the organizer may view registrations for this activity",
        ));
    }
    Ok(())
}

pub async fn register_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<ActivityRegistrationsRow>), Error> {
    let registration =
        registration_service::register(&pool, &auth_user.id, &body.activity_id, body.notes).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<ActivityRegistrationsRow>, Error> {
    let registration = registration_service::cancel(&pool, &auth_user.id, &activity_id).await?;
    Ok(Json(registration))
}

pub async fn my_registrations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<RegistrationWithActivityView>>, Error> {
    let registrations = registration_service::list_for_user(
        &pool,
        &auth_user.id,
        query.status.as_deref(),
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(registrations))
}

pub async fn check_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<Value>, Error> {
    let registration = registration_service::check(&pool, &auth_user.id, &activity_id).await?;
    Ok(Json(json!({
        "registered": registration.is_some(),
        "registration": registration,
    })))
}

pub async fn activity_registrations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<RegistrationWithUserView>>, Error> {
    require_organizer(&pool, &activity_id, &auth_user.id).await?;
    let registrations = registration_service::list_for_activity(
        &pool,
        &activity_id,
        query.status.as_deref(),
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(registrations))
}

pub async fn stats_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<RegistrationStatsView>, Error> {
    require_organizer(&pool, &activity_id, &auth_user.id).await?;
    let stats = registration_service::stats(&pool, &activity_id).await?;
    Ok(Json(stats))
}
