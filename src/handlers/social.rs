// src/handlers/social.rs
//
// Follow/unfollow relationships and the follower/following listings.
// Follower and following counts are always derived by counting rows,
// never stored redundantly.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{params::PageParams, user::PublicUser},
    utils::jwt::Claims,
};

async fn resolve_user_id(pool: &PgPool, username: &str) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Follow a user.
///
/// The insert carries no existence pre-check: the composite primary key on
/// (follower_id, following_id) rejects a duplicate, concurrent or not, and
/// the violation is surfaced as 409.
pub async fn follow_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let follower_id = claims.user_id();
    let following_id = resolve_user_id(&pool, &username).await?;

    if follower_id == following_id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }

    sqlx::query("INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)")
        .bind(follower_id)
        .bind(following_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Already following this user".to_string())
            } else {
                tracing::error!("Failed to follow user: {:?}", e);
                AppError::from(e)
            }
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Unfollow a user.
///
/// Unconditional delete: removing a relationship that does not exist is a
/// no-op success, so a retried or double-clicked unfollow never errors.
pub async fn unfollow_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let follower_id = claims.user_id();
    let following_id = resolve_user_id(&pool, &username).await?;

    sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
        .bind(follower_id)
        .bind(following_id)
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// List the accounts following a user, newest relationship first.
pub async fn list_followers(
    State(pool): State<PgPool>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = resolve_user_id(&pool, &username).await?;

    let followers = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT u.id, u.username, u.name, u.image, u.bio
        FROM follows f
        JOIN users u ON f.follower_id = u.id
        WHERE f.following_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(followers))
}

/// List the accounts a user follows, newest relationship first.
pub async fn list_following(
    State(pool): State<PgPool>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = resolve_user_id(&pool, &username).await?;

    let following = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT u.id, u.username, u.name, u.image, u.bio
        FROM follows f
        JOIN users u ON f.following_id = u.id
        WHERE f.follower_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(following))
}
