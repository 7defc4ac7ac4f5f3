// src/handlers/users.rs
//
// Public profile pages: the user's public fields, live stats, the
// viewer-relative follow flag, and the user's published posts.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        params::PageParams,
        post::{PostResponse, PostRow},
        user::{ProfileResponse, ProfileStats, User},
    },
    utils::jwt::OptionalClaims,
};

/// Get a user's public profile by username.
///
/// `posts_count` counts published posts only: a draft count is never exposed
/// through this path. `is_following` is computed only when an authenticated
/// viewer other than the profile owner is present; self-follow is
/// structurally impossible, so self view reports false.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Path(username): Path<String>,
    Extension(claims): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, name, bio, image,
               website, twitter, linkedin, github, location, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&username)
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
        .bind(user.id)
        .fetch_one(&pool)
        .await?;

    let viewer_id = claims.viewer_id();
    let is_following = match viewer_id {
        viewer if viewer != 0 && viewer != user.id => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
            )
            .bind(viewer)
            .bind(user.id)
            .fetch_one(&pool)
            .await?
        }
        _ => false,
    };

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        name: user.name,
        bio: user.bio,
        image: user.image,
        website: user.website,
        twitter: user.twitter,
        linkedin: user.linkedin,
        github: user.github,
        location: user.location,
        created_at: user.created_at,
        is_following,
        stats: ProfileStats {
            posts_count,
            followers_count,
            following_count,
        },
    }))
}

/// List a user's published posts, newest publication first.
/// Drafts are never included, not even for the author.
pub async fn list_user_posts(
    State(pool): State<PgPool>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let posts = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT
            p.id, p.author_id, p.title, p.slug, p.excerpt, p.content,
            p.cover_image, p.published, p.published_at, p.created_at, p.updated_at,
            u.username AS author_username, u.name AS author_name, u.image AS author_image,
            (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
            (SELECT COUNT(*) FROM bookmarks b WHERE b.post_id = p.id) AS bookmarks_count,
            FALSE AS is_liked,
            FALSE AS is_bookmarked
        FROM posts p
        JOIN users u ON p.author_id = u.id
        WHERE u.username = $1 AND p.published
        ORDER BY p.published_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&username)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    Ok(Json(posts))
}
