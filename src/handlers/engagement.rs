// src/handlers/engagement.rs
//
// Likes, bookmarks, and comments. The like/bookmark toggles are delete-first:
// one DELETE, and only if nothing was deleted an INSERT .. ON CONFLICT DO
// NOTHING. Two concurrent toggles by the same user cannot double-create a
// row; the unique key absorbs the race instead of the pre-check.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{CommentResponse, CommentRow, CreateCommentRequest},
        post::PostAuthor,
    },
    utils::{
        html::clean_html,
        jwt::{Claims, OptionalClaims},
    },
};

async fn ensure_post_exists(pool: &PgPool, post_id: i64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound("Post not found".to_string()))
    }
}

/// Toggle Like on a post. Returns the new state and the refreshed live count.
pub async fn toggle_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    ensure_post_exists(&pool, post_id).await?;

    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let is_liked = deleted == 0;
    if is_liked {
        sqlx::query(
            "INSERT INTO post_likes (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "is_liked": is_liked, "count": count })))
}

/// Toggle Bookmark on a post. Same shape as the like toggle.
pub async fn toggle_bookmark(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    ensure_post_exists(&pool, post_id).await?;

    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let is_bookmarked = deleted == 0;
    if is_bookmarked {
        sqlx::query(
            "INSERT INTO bookmarks (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookmarks WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "is_bookmarked": is_bookmarked, "count": count })))
}

/// Create a new comment on a post.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }

    let author_id = claims.user_id();
    ensure_post_exists(&pool, post_id).await?;

    let content = clean_html(&payload.content);

    let (id, created_at) = sqlx::query_as::<_, (i64, chrono::DateTime<chrono::Utc>)>(
        r#"
        INSERT INTO comments (post_id, author_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, created_at
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(&content)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::from(e)
    })?;

    let author = sqlx::query_as::<_, (i64, String, Option<String>, Option<String>)>(
        "SELECT id, username, name, image FROM users WHERE id = $1",
    )
    .bind(author_id)
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id,
            post_id,
            content,
            created_at: Some(created_at),
            author: PostAuthor {
                id: author.0,
                username: author.1,
                name: author.2,
                image: author.3,
            },
            likes_count: 0,
            is_liked: false,
        }),
    ))
}

/// List all comments on a post, newest first, annotated with like counts
/// and the viewer's like status when a viewer is present.
pub async fn list_comments(
    State(pool): State<PgPool>,
    Path(post_id): Path<i64>,
    Extension(claims): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, AppError> {
    ensure_post_exists(&pool, post_id).await?;

    let viewer_id = claims.viewer_id();

    let comments = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT
            c.id, c.post_id, c.content, c.created_at,
            u.id AS author_id, u.username AS author_username,
            u.name AS author_name, u.image AS author_image,
            (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = c.id) AS likes_count,
            EXISTS(SELECT 1 FROM comment_likes cl2 WHERE cl2.comment_id = c.id AND cl2.user_id = $2) AS is_liked
        FROM comments c
        JOIN users u ON c.author_id = u.id
        WHERE c.post_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(post_id)
    .bind(viewer_id)
    .fetch_all(&pool)
    .await?;

    let comments: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();

    Ok(Json(comments))
}

/// Toggle Like on a comment.
pub async fn toggle_comment_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
        .bind(comment_id)
        .fetch_one(&pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
        .bind(user_id)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let is_liked = deleted == 0;
    if is_liked {
        sqlx::query(
            "INSERT INTO comment_likes (user_id, comment_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;
    }

    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "is_liked": is_liked, "count": count })))
}
