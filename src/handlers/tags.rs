// src/handlers/tags.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::tag::{CreateTagRequest, Tag},
    utils::slug::slugify,
};

/// List all tags, most used first.
pub async fn list_tags(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT id, name, slug, usage_count FROM tags ORDER BY usage_count DESC, name ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(tags))
}

/// Create a new tag by name; the slug is derived from the name.
pub async fn create_tag(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim();
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Tag name must contain at least one alphanumeric character".to_string(),
        ));
    }

    let tag = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name, slug)
        VALUES ($1, $2)
        RETURNING id, name, slug, usage_count
        "#,
    )
    .bind(name)
    .bind(&slug)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Tag '{}' already exists", slug))
        } else {
            tracing::error!("Failed to create tag: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(tag)))
}
