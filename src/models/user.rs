// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique, immutable handle.
    pub username: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub location: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Public-safe projection of a user, used for follower/following listings
/// and embedded author blocks. Never carries email or internal fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Live aggregates over the social relations; never stored.
#[derive(Debug, Serialize)]
pub struct ProfileStats {
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

/// A user's public profile page payload.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether the viewer follows this user. False for anonymous or self view.
    pub is_following: bool,
    pub stats: ProfileStats,
}

/// The caller's own profile, email included.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stats: ProfileStats,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(email(message = "A valid email address is required."))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for updating the caller's own profile. The username handle and email
/// are immutable through this path.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 500))]
    pub website: Option<String>,
    #[validate(length(max = 100))]
    pub twitter: Option<String>,
    #[validate(length(max = 100))]
    pub linkedin: Option<String>,
    #[validate(length(max = 100))]
    pub github: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}
