use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Error;
use crate::services::user_service;
use crate::web::middleware::auth::issue_token;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}

pub async fn register_handler(
    State(pool): State<SqlitePool>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<AuthResponse>, Error> {
    let user = user_service::register(&pool, &body.username, &body.password).await?;
    info!(username = %user.username, "user registered");
    let token = issue_token(&user.user_id, &user.username)?;
    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}

pub async fn login_handler(
    State(pool): State<SqlitePool>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<AuthResponse>, Error> {
    let user = user_service::verify_credentials(&pool, &body.username, &body.password).await?;
    let token = issue_token(&user.user_id, &user.username)?;
    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}
