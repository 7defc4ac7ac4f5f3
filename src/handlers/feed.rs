// src/handlers/feed.rs
//
// The personalized feed: published posts authored by accounts the caller
// follows, newest publication first. An empty follow set is an empty page,
// not an error.

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        params::PageParams,
        post::{PostResponse, PostRow},
    },
    utils::jwt::Claims,
};

/// Get the caller's feed page. Page and limit are clamped by `PageParams`,
/// so a hostile `limit=1000000` cannot produce an unbounded result set.
pub async fn get_feed(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = claims.user_id();

    let posts = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT
            p.id, p.author_id, p.title, p.slug, p.excerpt, p.content,
            p.cover_image, p.published, p.published_at, p.created_at, p.updated_at,
            u.username AS author_username, u.name AS author_name, u.image AS author_image,
            (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
            (SELECT COUNT(*) FROM bookmarks b WHERE b.post_id = p.id) AS bookmarks_count,
            EXISTS(SELECT 1 FROM post_likes pl2 WHERE pl2.post_id = p.id AND pl2.user_id = $1) AS is_liked,
            EXISTS(SELECT 1 FROM bookmarks b2 WHERE b2.post_id = p.id AND b2.user_id = $1) AS is_bookmarked
        FROM posts p
        JOIN users u ON p.author_id = u.id
        WHERE p.published
          AND EXISTS(
              SELECT 1 FROM follows f
              WHERE f.follower_id = $1 AND f.following_id = p.author_id
          )
        ORDER BY p.published_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(viewer_id)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch feed: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    Ok(Json(posts))
}
