use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::post::PostAuthor;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Flat row shape for comment listings: the comment, its author columns,
/// the live like count, and the viewer's like status.
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub author_id: i64,
    pub author_username: String,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
    pub likes_count: i64,
    pub is_liked: bool,
}

/// Comment payload as returned to clients.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub author: PostAuthor,
    pub likes_count: i64,
    pub is_liked: bool,
}

impl From<CommentRow> for CommentResponse {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            created_at: row.created_at,
            author: PostAuthor {
                id: row.author_id,
                username: row.author_username,
                name: row.author_name,
                image: row.author_image,
            },
            likes_count: row.likes_count,
            is_liked: row.is_liked,
        }
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        max = 2000,
        message = "Comment must be at most 2000 characters"
    ))]
    pub content: String,
}
