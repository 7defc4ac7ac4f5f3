// src/handlers/profile.rs
//
// The authenticated caller's own profile.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{MeResponse, ProfileStats, UpdateProfileRequest, User},
    utils::jwt::Claims,
};

/// Get the current user's profile and statistics, email included.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, name, bio, image,
               website, twitter, linkedin, github, location, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let (posts_count, followers_count, following_count) =
        sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = $1 AND published),
                (SELECT COUNT(*) FROM follows WHERE following_id = $1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        name: user.name,
        bio: user.bio,
        image: user.image,
        website: user.website,
        twitter: user.twitter,
        linkedin: user.linkedin,
        github: user.github,
        location: user.location,
        created_at: user.created_at,
        stats: ProfileStats {
            posts_count,
            followers_count,
            following_count,
        },
    }))
}

/// Update the current user's profile fields.
/// The username handle and email are immutable; absent fields are unchanged.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if let Some(website) = payload.website.as_deref()
        && !website.is_empty()
        && Url::parse(website).is_err()
    {
        return Err(AppError::BadRequest("Website must be a valid URL".to_string()));
    }

    let user_id = claims.user_id();

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            bio = COALESCE($3, bio),
            image = COALESCE($4, image),
            website = COALESCE($5, website),
            twitter = COALESCE($6, twitter),
            linkedin = COALESCE($7, linkedin),
            github = COALESCE($8, github),
            location = COALESCE($9, location)
        WHERE id = $1
        RETURNING id, username, email, password, name, bio, image,
                  website, twitter, linkedin, github, location, created_at
        "#,
    )
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.bio)
    .bind(&payload.image)
    .bind(&payload.website)
    .bind(&payload.twitter)
    .bind(&payload.linkedin)
    .bind(&payload.github)
    .bind(&payload.location)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
