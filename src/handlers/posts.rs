// src/handlers/posts.rs
//
// Post authoring: create/read/update/delete, slug derivation and collision
// handling, tag attachment, and the denormalized tag usage counters.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        params::PageParams,
        post::{
            CreatePostRequest, Pagination, PostListQuery, PostResponse, PostRow,
            UpdatePostRequest,
        },
        tag::Tag,
    },
    utils::{
        html::clean_html,
        jwt::{Claims, OptionalClaims},
        slug::{dedupe_slug, slugify},
    },
};

/// Fetch a single post with author, live counts, viewer status, and tags.
/// `viewer_id` of 0 means anonymous (ids start at 1, so nothing matches).
async fn fetch_post(
    pool: &PgPool,
    post_id: i64,
    viewer_id: i64,
) -> Result<Option<PostResponse>, AppError> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT
            p.id, p.author_id, p.title, p.slug, p.excerpt, p.content,
            p.cover_image, p.published, p.published_at, p.created_at, p.updated_at,
            u.username AS author_username, u.name AS author_name, u.image AS author_image,
            (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
            (SELECT COUNT(*) FROM bookmarks b WHERE b.post_id = p.id) AS bookmarks_count,
            EXISTS(SELECT 1 FROM post_likes pl2 WHERE pl2.post_id = p.id AND pl2.user_id = $2) AS is_liked,
            EXISTS(SELECT 1 FROM bookmarks b2 WHERE b2.post_id = p.id AND b2.user_id = $2) AS is_bookmarked
        FROM posts p
        JOIN users u ON p.author_id = u.id
        WHERE p.id = $1
        "#,
    )
    .bind(post_id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut response = PostResponse::from(row);
    response.tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.slug, t.usage_count
        FROM tags t
        JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(response))
}

/// Create a new post.
///
/// The post row, its tag links, and the tag usage counters are written in a
/// single transaction, so a failed tag attach never leaves a half-created
/// post visible.
pub async fn create_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = payload.title.trim();
    if title.is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Title and content are required".to_string(),
        ));
    }

    let author_id = claims.user_id();
    let content = clean_html(&payload.content);

    let mut tag_slugs = payload.tags.unwrap_or_default();
    tag_slugs.sort();
    tag_slugs.dedup();

    let mut tx = pool.begin().await?;

    // Every supplied tag slug must resolve; otherwise nothing is persisted.
    if !tag_slugs.is_empty() {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tags WHERE slug = ANY($1)",
        )
        .bind(&tag_slugs)
        .fetch_one(&mut *tx)
        .await?;

        if found != tag_slugs.len() as i64 {
            return Err(AppError::BadRequest(
                "Some tags are invalid or missing".to_string(),
            ));
        }
    }

    let base_slug = slugify(title);
    let base_slug = if base_slug.is_empty() {
        dedupe_slug("post")
    } else {
        base_slug
    };

    let slug_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)",
    )
    .bind(&base_slug)
    .fetch_one(&mut *tx)
    .await?;

    let final_slug = if slug_taken {
        dedupe_slug(&base_slug)
    } else {
        base_slug
    };

    let post_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (author_id, title, slug, excerpt, content, cover_image, published, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 THEN NOW() ELSE NULL END)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(title)
    .bind(&final_slug)
    .bind(&payload.excerpt)
    .bind(&content)
    .bind(&payload.cover_image)
    .bind(payload.published)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        // The unique constraint is the backstop for a concurrent slug race.
        if is_unique_violation(&e) {
            AppError::Conflict("Slug already exists".to_string())
        } else {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::from(e)
        }
    })?;

    if !tag_slugs.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO post_tags (post_id, tag_id)
            SELECT $1, t.id FROM tags t WHERE t.slug = ANY($2)
            "#,
        )
        .bind(post_id)
        .bind(&tag_slugs)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE tags SET usage_count = usage_count + 1 WHERE slug = ANY($1)")
            .bind(&tag_slugs)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let post = fetch_post(&pool, post_id, author_id)
        .await?
        .ok_or(AppError::InternalServerError("Post vanished after create".to_string()))?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Public listing of published posts with optional tag and search filters,
/// plus a pagination block.
pub async fn list_posts(
    State(pool): State<PgPool>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let filter = r#"
        WHERE p.published
          AND ($1::TEXT IS NULL OR EXISTS(
              SELECT 1 FROM post_tags pt
              JOIN tags t ON pt.tag_id = t.id
              WHERE pt.post_id = p.id AND t.slug = $1
          ))
          AND ($2::TEXT IS NULL
               OR p.title ILIKE '%' || $2 || '%'
               OR p.content ILIKE '%' || $2 || '%')
    "#;

    let posts = sqlx::query_as::<_, PostRow>(&format!(
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
        {filter}
        ORDER BY p.published_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(&query.tag)
    .bind(&query.search)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM posts p {filter}"
    ))
    .bind(&query.tag)
    .bind(&query.search)
    .fetch_one(&pool)
    .await?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    Ok(Json(serde_json::json!({
        "posts": posts,
        "pagination": Pagination {
            page: params.page(),
            limit: params.limit(),
            total,
            pages: (total + params.limit() - 1) / params.limit(),
        },
    })))
}

/// Get a single post by ID.
/// A draft is visible only to its author; everyone else sees 404.
pub async fn get_post(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Extension(claims): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = claims.viewer_id();

    let post = fetch_post(&pool, id, viewer_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if !post.published && post.author.id != viewer_id {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    Ok(Json(post))
}

/// Update a post. Owner only; a changed slug must not collide with a
/// different existing post.
pub async fn update_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty())
        || payload.content.as_deref().is_some_and(|c| c.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "Title and content cannot be empty".to_string(),
        ));
    }

    let requester_id = claims.user_id();

    let existing = sqlx::query_as::<_, (i64, String)>(
        "SELECT author_id, slug FROM posts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let (author_id, current_slug) = existing;

    if author_id != requester_id {
        return Err(AppError::Forbidden(
            "You are not the author of this post".to_string(),
        ));
    }

    if let Some(new_slug) = payload.slug.as_deref()
        && new_slug != current_slug
    {
        let conflict = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND id <> $2)",
        )
        .bind(new_slug)
        .bind(id)
        .fetch_one(&pool)
        .await?;

        if conflict {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }
    }

    let content = payload.content.as_deref().map(clean_html);

    sqlx::query(
        r#"
        UPDATE posts SET
            title = COALESCE($2, title),
            content = COALESCE($3, content),
            excerpt = COALESCE($4, excerpt),
            slug = COALESCE($5, slug),
            cover_image = COALESCE($6, cover_image),
            published = COALESCE($7, published),
            published_at = CASE
                WHEN COALESCE($7, published) AND published_at IS NULL THEN NOW()
                ELSE published_at
            END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(payload.title.as_deref().map(str::trim))
    .bind(&content)
    .bind(&payload.excerpt)
    .bind(&payload.slug)
    .bind(&payload.cover_image)
    .bind(payload.published)
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Slug already exists".to_string())
        } else {
            tracing::error!("Failed to update post: {:?}", e);
            AppError::from(e)
        }
    })?;

    let post = fetch_post(&pool, id, requester_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Delete a post. Owner only.
///
/// Tag usage counters are decremented in the same transaction; the likes,
/// comments, bookmarks, and tag links go away via FK cascade.
pub async fn delete_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id();

    let author_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if author_id != requester_id {
        return Err(AppError::Forbidden(
            "You are not the author of this post".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE tags SET usage_count = GREATEST(0, usage_count - 1)
        WHERE id IN (SELECT tag_id FROM post_tags WHERE post_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
