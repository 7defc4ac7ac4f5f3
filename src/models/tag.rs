use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'tags' table in the database.
/// `usage_count` is the one sanctioned denormalized counter in the schema;
/// it is incremented when a post attaches the tag and decremented when a
/// post carrying it is deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub usage_count: i32,
}

/// DTO for creating a new tag.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Tag name must be between 1 and 50 characters"
    ))]
    pub name: String,
}
