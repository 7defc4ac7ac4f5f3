use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::tag::Tag;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    /// Globally unique, URL-safe identifier derived from the title.
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    /// Drafts (published = false) are visible only to their author.
    pub published: bool,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Author block embedded in post payloads.
#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Flat row shape produced by the post listing/detail queries: the post,
/// its author columns, live engagement counts, and the viewer's status.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub author_username: String,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub bookmarks_count: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

/// Post payload as returned to clients.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub author: PostAuthor,
    pub likes_count: i64,
    pub comments_count: i64,
    pub bookmarks_count: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub tags: Vec<Tag>,
}

impl From<PostRow> for PostResponse {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            cover_image: row.cover_image,
            published: row.published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: PostAuthor {
                id: row.author_id,
                username: row.author_username,
                name: row.author_name,
                image: row.author_image,
            },
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            bookmarks_count: row.bookmarks_count,
            is_liked: row.is_liked,
            is_bookmarked: row.is_bookmarked,
            tags: Vec::new(),
        }
    }
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 chars"))]
    pub title: String,

    #[validate(length(max = 100000, message = "Content must be at most 100000 chars"))]
    pub content: String,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    #[serde(default)]
    pub published: bool,

    /// Tag slugs; every one must resolve to an existing tag.
    pub tags: Option<Vec<String>>,

    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
}

/// DTO for updating a post. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100000))]
    pub content: Option<String>,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    #[validate(length(min = 1, max = 250))]
    pub slug: Option<String>,

    pub published: Option<bool>,

    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
}

/// Query parameters for the public post listing.
#[derive(Debug, Deserialize, Default)]
pub struct PostListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Filter: tag slug.
    pub tag: Option<String>,
    /// Filter: case-insensitive match against title or content.
    pub search: Option<String>,
}

/// Pagination block returned next to the public post listing.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}
