use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, comment_repo};
use crate::error::Error;
use crate::models::{ActivityCommentsRow, UserRef};
use crate::services::{page_window, total_pages};

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct CommentPageView {
    pub comments: Vec<CommentView>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct RatingStatsView {
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct UserCommentView {
    pub id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub activity: ActivityRef,
}

#[derive(Debug, Serialize)]
pub struct UserCommentPageView {
    pub comments: Vec<UserCommentView>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

fn validate_rating(rating: Option<i64>) -> Result<(), Error> {
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            return Err(Error::InvalidArgument(
                "rating must be between 1 and 5".into(),
            ));
        }
    }
    Ok(())
}

pub async fn add(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    content: &str,
    rating: Option<i64>,
    parent_id: Option<&str>,
) -> Result<ActivityCommentsRow, Error> {
    if activity_repo::find_by_id(pool, activity_id).await?.is_none() {
        return Err(Error::NotFound("activity not found"));
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::InvalidArgument("comment content is required".into()));
    }
    if let Some(parent_id) = parent_id {
        let parent = comment_repo::find_by_id(pool, parent_id)
            .await?
            .ok_or(Error::NotFound("parent comment not found"))?;
        if parent.activity_id != activity_id {
            return Err(Error::InvalidArgument(
                "parent comment belongs to a different activity".into(),
            ));
        }
        // Replies are one level deep, which the cascade delete relies on.
        if parent.parent_id.is_some() {
            return Err(Error::InvalidArgument("cannot reply to a reply".into()));
        }
    }
    validate_rating(rating)?;

    let now = Utc::now();
    let row = ActivityCommentsRow {
        comment_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        activity_id: activity_id.to_string(),
        content: content.to_string(),
        rating,
        parent_id: parent_id.map(str::to_string),
        created_at: now,
        updated_at: now,
    };
    comment_repo::insert_comment(pool, &row).await?;
    Ok(row)
}

fn to_view(row: comment_repo::CommentWithUserRow, replies: Vec<CommentView>) -> CommentView {
    CommentView {
        id: row.comment_id,
        activity_id: row.activity_id,
        content: row.content,
        rating: row.rating,
        parent_id: row.parent_id,
        created_at: row.created_at,
        user: UserRef {
            id: row.user_id,
            username: row.username,
        },
        replies,
    }
}

/// Top-level comments, newest first, paginated; every returned comment
/// carries its full reply list oldest-first. Replies never count toward the
/// page window.
pub async fn list_for_activity(
    pool: &SqlitePool,
    activity_id: &str,
    page: i64,
    page_size: i64,
) -> Result<CommentPageView, Error> {
    let (limit, offset) = page_window(page, page_size);
    let total = comment_repo::count_top_level(pool, activity_id).await?;
    let top_level = comment_repo::list_top_level(pool, activity_id, limit, offset).await?;
    let replies = comment_repo::list_replies_for_window(pool, activity_id, limit, offset).await?;

    let mut by_parent: HashMap<String, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        let parent = reply.parent_id.clone().unwrap_or_default();
        by_parent
            .entry(parent)
            .or_default()
            .push(to_view(reply, Vec::new()));
    }

    let comments = top_level
        .into_iter()
        .map(|row| {
            let replies = by_parent.remove(&row.comment_id).unwrap_or_default();
            to_view(row, replies)
        })
        .collect();

    Ok(CommentPageView {
        comments,
        total,
        page: page.max(1),
        page_size: limit,
        total_pages: total_pages(total, limit),
    })
}

pub async fn get(pool: &SqlitePool, comment_id: &str) -> Result<CommentView, Error> {
    let row = comment_repo::find_with_user(pool, comment_id)
        .await?
        .ok_or(Error::NotFound("comment not found"))?;
    let replies = comment_repo::list_replies(pool, comment_id)
        .await?
        .into_iter()
        .map(|r| to_view(r, Vec::new()))
        .collect();
    Ok(to_view(row, replies))
}

pub async fn update(
    pool: &SqlitePool,
    comment_id: &str,
    user_id: &str,
    content: &str,
    rating: Option<i64>,
) -> Result<ActivityCommentsRow, Error> {
    let comment = comment_repo::find_by_id(pool, comment_id)
        .await?
        .ok_or(Error::NotFound("comment not found"))?;
    if comment.user_id != user_id {
        return Err(Error::Forbidden("can only modify your own comments"));
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::InvalidArgument("comment content is required".into()));
    }
    validate_rating(rating)?;

    let now = Utc::now();
    comment_repo::update_comment(pool, comment_id, content, rating, now).await?;
    Ok(ActivityCommentsRow {
        content: content.to_string(),
        rating,
        updated_at: now,
        ..comment
    })
}

/// Author-only delete; takes the comment's direct replies with it in the
/// same statement. Returns how many rows went.
pub async fn delete(pool: &SqlitePool, comment_id: &str, user_id: &str) -> Result<u64, Error> {
    let comment = comment_repo::find_by_id(pool, comment_id)
        .await?
        .ok_or(Error::NotFound("comment not found"))?;
    if comment.user_id != user_id {
        return Err(Error::Forbidden("can only delete your own comments"));
    }
    Ok(comment_repo::delete_with_replies(pool, comment_id).await?)
}

/// Average over rated comments only, one decimal; {0.0, 0} when none.
pub async fn rating_stats(pool: &SqlitePool, activity_id: &str) -> Result<RatingStatsView, Error> {
    let row = comment_repo::rating_stats(pool, activity_id).await?;
    let average = row.average_rating.unwrap_or(0.0);
    Ok(RatingStatsView {
        average_rating: (average * 10.0).round() / 10.0,
        total_ratings: row.total_ratings,
    })
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    page: i64,
    page_size: i64,
) -> Result<UserCommentPageView, Error> {
    let (limit, offset) = page_window(page, page_size);
    let total = comment_repo::count_for_user(pool, user_id).await?;
    let rows = comment_repo::list_for_user(pool, user_id, limit, offset).await?;
    Ok(UserCommentPageView {
        comments: rows
            .into_iter()
            .map(|r| UserCommentView {
                id: r.comment_id,
                content: r.content,
                rating: r.rating,
                parent_id: r.parent_id,
                created_at: r.created_at,
                activity: ActivityRef {
                    id: r.activity_id,
                    title: r.activity_title,
                },
            })
            .collect(),
        total,
        page: page.max(1),
        page_size: limit,
        total_pages: total_pages(total, limit),
    })
}
