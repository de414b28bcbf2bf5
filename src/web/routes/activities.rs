use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::error::Error;
use crate::services::activity_service::{
    self, ActivityPageView, ActivityPatch, ActivitySearchParams, ActivityView, NewActivityInput,
};
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CreateActivityBody {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_participants: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub organizer_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

pub async fn create_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Json(body): Json<CreateActivityBody>,
) -> Result<(StatusCode, Json<ActivityView>), Error> {
    let view = activity_service::create(
        &pool,
        &auth_user.id,
        NewActivityInput {
            title: body.title,
            description: body.description,
            location: body.location,
            start_time: body.start_time,
            end_time: body.end_time,
            max_participants: body.max_participants.unwrap_or(0),
            price: body.price.unwrap_or(0.0),
            status: body.status,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_handler(
    State(pool): State<SqlitePool>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ActivityPageView>, Error> {
    let view = activity_service::list(
        &pool,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
        query.status.as_deref(),
    )
    .await?;
    Ok(Json(view))
}

pub async fn search_handler(
    State(pool): State<SqlitePool>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ActivityPageView>, Error> {
    let params = ActivitySearchParams {
        keyword: query.keyword,
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
        min_price: query.min_price,
        max_price: query.max_price,
        organizer_id: query.organizer_id,
    };
    let view = activity_service::search(
        &pool,
        &params,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(view))
}

pub async fn popular_handler(
    State(pool): State<SqlitePool>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ActivityView>>, Error> {
    let activities = activity_service::popular(&pool, query.limit.unwrap_or(10)).await?;
    Ok(Json(activities))
}

pub async fn upcoming_handler(
    State(pool): State<SqlitePool>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ActivityView>>, Error> {
    let activities = activity_service::upcoming(&pool, query.limit.unwrap_or(10)).await?;
    Ok(Json(activities))
}

pub async fn my_activities_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ActivityPageView>, Error> {
    let view = activity_service::list_for_organizer(
        &pool,
        &auth_user.id,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(view))
}

pub async fn get_handler(
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<ActivityView>, Error> {
    let view = activity_service::get(&pool, &activity_id).await?;
    Ok(Json(view))
}

pub async fn update_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
    Json(body): Json<UpdateActivityBody>,
) -> Result<Json<ActivityView>, Error> {
    let view = activity_service::update(
        &pool,
        &activity_id,
        &auth_user.id,
        ActivityPatch {
            title: body.title,
            description: body.description,
            location: body.location,
            start_time: body.start_time,
            end_time: body.end_time,
            max_participants: body.max_participants,
            price: body.price,
            status: body.status,
        },
    )
    .await?;
    Ok(Json(view))
}

pub async fn delete_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<Value>, Error> {
    activity_service::delete(&pool, &activity_id, &auth_user.id).await?;
    Ok(Json(json!({ "message": "activity deleted" })))
}
