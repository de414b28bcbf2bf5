use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::user_repo;
use crate::error::{is_unique_violation, Error};
use crate::models::UsersRow;

pub async fn register(pool: &SqlitePool, username: &str, password: &str) -> Result<UsersRow, Error> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidArgument("username is required".into()));
    }
    if password.is_empty() {
        return Err(Error::InvalidArgument("password is required".into()));
    }
    if user_repo::find_by_username(pool, username).await?.is_some() {
        return Err(Error::Conflict("username already taken"));
    }

    let password_hash = hash(password, DEFAULT_COST)?;
    let user_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let res = user_repo::insert_user(
        pool,
        user_repo::NewUser {
            user_id: &user_id,
            username,
            password_hash: &password_hash,
            now,
        },
    )
    .await;
    match res {
        Ok(_) => {}
        // Lost a race on the UNIQUE(username) index.
        Err(e) if is_unique_violation(&e) => return Err(Error::Conflict("username already taken")),
        Err(e) => return Err(e.into()),
    }

    Ok(UsersRow {
        user_id,
        username: username.to_string(),
        password_hash,
        created_at: now,
        updated_at: now,
    })
}

/// One message for both unknown-user and wrong-password, so callers cannot
/// probe which usernames exist.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<UsersRow, Error> {
    let Some(user) = user_repo::find_by_username(pool, username.trim()).await? else {
        return Err(Error::Unauthorized("invalid username or password"));
    };
    if !verify(password, &user.password_hash)? {
        return Err(Error::Unauthorized("invalid username or password"));
    }
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<UsersRow>, Error> {
    Ok(user_repo::find_by_id(pool, user_id).await?)
}
