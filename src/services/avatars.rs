//!
//! Avatar reference management.
//!
//! The binary upload and resize pipeline is an external collaborator; this
//! module only stores and clears the `/upload/<file>` reference it hands
//! back, plus the best-effort removal of the file it points at.

use std::path::Path;

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::User;
use crate::services::users;

const USER_COLUMNS: &str = "id, email, name, password_hash, avatar_url, created_at";

/// Stores the avatar URL returned by the upload collaborator on the
/// caller's account.
pub async fn upload_url(pool: &PgPool, id: i32, avatar_url: &str) -> Result<User, AppError> {
    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET avatar_url = $1 WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(avatar_url)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    updated.ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
}

/// Clears the caller's avatar and best-effort removes the stored file.
pub async fn delete(
    pool: &PgPool,
    uploads_dir: &str,
    caller_id: i32,
    target_id: i32,
) -> Result<User, AppError> {
    if caller_id != target_id {
        return Err(AppError::Forbidden(
            "Avatar can only be deleted by its owner".into(),
        ));
    }

    let user = users::find_by_id(pool, caller_id).await?;
    let avatar_url = user
        .avatar_url
        .ok_or_else(|| AppError::Validation("No avatar is set".into()))?;

    remove_avatar_file(uploads_dir, &avatar_url).await;

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET avatar_url = NULL WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(caller_id)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

/// Removes the file behind an avatar URL.
///
/// A non-fatal side effect: failure is captured and logged, never
/// propagated, so a missing file can't block an avatar or account deletion.
pub async fn remove_avatar_file(uploads_dir: &str, avatar_url: &str) {
    let filename = match avatar_url.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => {
            log::warn!("avatar url {:?} has no file component", avatar_url);
            return;
        }
    };

    let path = Path::new(uploads_dir).join(filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => log::info!("removed avatar file {}", path.display()),
        Err(e) => log::warn!("could not remove avatar file {}: {}", path.display(), e),
    }
}
