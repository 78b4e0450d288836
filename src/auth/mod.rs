pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserProfile;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for a new account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    /// Display name for the new account.
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for requesting a password-reset email.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email)]
    pub email: String,
}

/// Payload for applying a password reset: the credential from the emailed
/// link plus the replacement password.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetConfirmRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response after successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Signed session token for subsequent requests.
    pub token: String,
    pub user: UserProfile,
}
