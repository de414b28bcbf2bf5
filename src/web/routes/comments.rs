use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::error::Error;
use crate::models::ActivityCommentsRow;
use crate::services::comment_service::{
    self, CommentPageView, CommentView, RatingStatsView, UserCommentPageView,
};
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct AddCommentBody {
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentBody {
    pub content: String,
    pub rating: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn add_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Json(body): Json<AddCommentBody>,
) -> Result<(StatusCode, Json<ActivityCommentsRow>), Error> {
    let comment = comment_service::add(
        &pool,
        &auth_user.id,
        &body.activity_id,
        &body.content,
        body.rating,
        body.parent_id.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_for_activity_handler(
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CommentPageView>, Error> {
    let view = comment_service::list_for_activity(
        &pool,
        &activity_id,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(view))
}

pub async fn rating_stats_handler(
    State(pool): State<SqlitePool>,
    Path(activity_id): Path<String>,
) -> Result<Json<RatingStatsView>, Error> {
    let stats = comment_service::rating_stats(&pool, &activity_id).await?;
    Ok(Json(stats))
}

pub async fn get_handler(
    State(pool): State<SqlitePool>,
    Path(comment_id): Path<String>,
) -> Result<Json<CommentView>, Error> {
    let view = comment_service::get(&pool, &comment_id).await?;
    Ok(Json(view))
}

pub async fn update_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(comment_id): Path<String>,
    Json(body): Json<UpdateCommentBody>,
) -> Result<Json<ActivityCommentsRow>, Error> {
    let comment = comment_service::update(
        &pool,
        &comment_id,
        &auth_user.id,
        &body.content,
        body.rating,
    )
    .await?;
    Ok(Json(comment))
}

pub async fn delete_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>, Error> {
    comment_service::delete(&pool, &comment_id, &auth_user.id).await?;
    Ok(Json(json!({ "message": "comment deleted" })))
}

pub async fn my_comments_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserCommentPageView>, Error> {
    let view = comment_service::list_for_user(
        &pool,
        &auth_user.id,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(Json(view))
}
