use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    // Avatar references produced by the upload collaborator always look
    // like `/upload/<filename>`; anything else is rejected before storage.
    static ref AVATAR_URL_REGEX: regex::Regex =
        regex::Regex::new(r"^/upload/[A-Za-z0-9._-]+$").unwrap();
}

/// An account row as stored in the database.
///
/// Deliberately not `Serialize`: the password hash must never reach a
/// response body. Handlers convert to [`UserProfile`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    /// Stored lower-cased; uniqueness is enforced by the database index.
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// Payload for renaming the caller's account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNameRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
}

/// Payload carrying a single password, used by both the confirm-password
/// and change-password operations.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordRequest {
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for storing an avatar reference returned by the upload
/// collaborator.
#[derive(Debug, Deserialize, Validate)]
pub struct AvatarUrlRequest {
    #[validate(regex(
        path = "AVATAR_URL_REGEX",
        message = "Avatar URL must look like /upload/<filename>"
    ))]
    pub avatar_url: String,
}
