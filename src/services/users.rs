//!
//! Account directory and lifecycle operations.
//!
//! Every function here is owner-scoped: the id it receives comes from a
//! verified token (via `AuthMiddleware`), never from the request body,
//! except for `register`/`login`/the reset flow which establish identity.

use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenIssuer;
use crate::auth::RegisterRequest;
use crate::error::AppError;
use crate::mailer::ResetDelivery;
use crate::models::user::User;
use crate::services::avatars;

const USER_COLUMNS: &str = "id, email, name, password_hash, avatar_url, created_at";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Looks an account up by (case-normalized) email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Looks an account up by id.
///
/// This runs after the caller has already been authenticated, so absence is
/// server-side inconsistency (a deleted account with a live token), not a
/// caller error.
pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    user.ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
}

/// Creates an account and issues its first session token.
///
/// The uniqueness check and the insert are one statement: the database's
/// unique index on `email` arbitrates duplicate-email races, and a
/// violation surfaces as `Conflict`.
pub async fn register(
    pool: &PgPool,
    tokens: &TokenIssuer,
    bcrypt_cost: u32,
    request: RegisterRequest,
) -> Result<(User, String), AppError> {
    let email = normalize_email(&request.email);
    let password = request.password;

    // bcrypt is deliberately expensive; keep it off the async executor.
    let password_hash = web::block(move || hash_password(&password, bcrypt_cost)).await??;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&email)
    .bind(&request.name)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other,
    })?;

    let token = tokens.issue(user.id)?;
    Ok((user, token))
}

/// Authenticates by email and password.
///
/// Absent account and wrong password collapse to the same `BadCredentials`
/// error so the endpoint cannot be used to enumerate accounts.
pub async fn login(
    pool: &PgPool,
    tokens: &TokenIssuer,
    email: &str,
    password: &str,
) -> Result<(User, String), AppError> {
    let user = find_by_email(pool, email)
        .await?
        .ok_or(AppError::BadCredentials)?;

    let candidate = password.to_string();
    let stored_hash = user.password_hash.clone();
    let valid = web::block(move || verify_password(&candidate, &stored_hash)).await??;
    if !valid {
        return Err(AppError::BadCredentials);
    }

    let token = tokens.issue(user.id)?;
    Ok((user, token))
}

/// Renames the caller's account. A no-op rename is rejected rather than
/// silently accepted, so the caller can tell nothing changed.
pub async fn update_name(pool: &PgPool, id: i32, new_name: &str) -> Result<User, AppError> {
    let user = find_by_id(pool, id).await?;
    if user.name == new_name {
        return Err(AppError::Validation(
            "New name matches the current name".into(),
        ));
    }

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = $1 WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(new_name)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

/// Checks a password against the caller's stored hash. A mismatch is a
/// `false` result, not an error, so clients can re-prompt.
pub async fn confirm_password(pool: &PgPool, id: i32, password: &str) -> Result<bool, AppError> {
    let user = find_by_id(pool, id).await?;
    let candidate = password.to_string();
    let valid = web::block(move || verify_password(&candidate, &user.password_hash)).await??;
    Ok(valid)
}

/// Replaces the caller's password. Re-submitting the current password is
/// rejected as a no-op "change".
pub async fn update_password(
    pool: &PgPool,
    id: i32,
    new_password: &str,
    bcrypt_cost: u32,
) -> Result<(), AppError> {
    let user = find_by_id(pool, id).await?;

    let candidate = new_password.to_string();
    let stored_hash = user.password_hash.clone();
    let unchanged = web::block(move || verify_password(&candidate, &stored_hash)).await??;
    if unchanged {
        return Err(AppError::Validation(
            "New password matches the current password".into(),
        ));
    }

    let password = new_password.to_string();
    let password_hash = web::block(move || hash_password(&password, bcrypt_cost)).await??;

    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Issues a reset credential and hands it to the delivery collaborator.
///
/// The outcome is identical whether or not the account exists; delivery
/// failures are logged, never surfaced, so the endpoint leaks nothing.
pub async fn request_password_reset(
    pool: &PgPool,
    tokens: &TokenIssuer,
    mailer: Arc<dyn ResetDelivery>,
    app_base_url: &str,
    email: &str,
) -> Result<(), AppError> {
    let user = match find_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            log::info!("password reset requested for unknown email");
            return Ok(());
        }
    };

    let credential = tokens.issue_reset(user.id, &user.password_hash)?;
    let link = format!("{}/reset-password?token={}", app_base_url, credential);
    let to = user.email.clone();

    // SMTP transports are blocking.
    let outcome = web::block(move || mailer.send_reset(&to, &link)).await?;
    match outcome {
        Ok(receipt) => {
            log::info!("password reset dispatched, accepted: {:?}", receipt.accepted)
        }
        Err(e) => log::error!("password reset delivery failed: {}", e),
    }
    Ok(())
}

/// Applies a password reset from an emailed credential.
///
/// The credential's subject is peeked untrusted, the account loaded, and
/// only then is the signature verified against `secret || current hash`.
/// Persisting the new hash is what consumes the credential: the derived key
/// changes, so the same credential can never verify again.
pub async fn apply_password_reset(
    pool: &PgPool,
    tokens: &TokenIssuer,
    bcrypt_cost: u32,
    credential: &str,
    new_password: &str,
) -> Result<User, AppError> {
    let subject = tokens.peek_reset_subject(credential)?;

    // A credential naming a deleted account is just an invalid credential;
    // don't leak anything more specific.
    let user = find_by_id(pool, subject)
        .await
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token".into()))?;

    let id = tokens.verify_reset(credential, &user.password_hash)?;

    let password = new_password.to_string();
    let password_hash = web::block(move || hash_password(&password, bcrypt_cost)).await??;

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET password_hash = $1 WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&password_hash)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

/// Deletes the caller's account with its dependents.
///
/// Cascade order matters for crash safety: the avatar file first
/// (best-effort, failure logged), then every task owned by the account,
/// then the account row itself, so a crash mid-cascade never leaves a
/// task pointing at a deleted account.
pub async fn delete(
    pool: &PgPool,
    uploads_dir: &str,
    caller_id: i32,
    target_id: i32,
) -> Result<u64, AppError> {
    if caller_id != target_id {
        return Err(AppError::Forbidden(
            "Account can only be deleted by its owner".into(),
        ));
    }

    let user = find_by_id(pool, caller_id).await?;

    if let Some(avatar_url) = &user.avatar_url {
        avatars::remove_avatar_file(uploads_dir, avatar_url).await;
    }

    let tasks_removed = sqlx::query("DELETE FROM tasks WHERE user_id = $1")
        .bind(caller_id)
        .execute(pool)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(caller_id)
        .execute(pool)
        .await?;

    log::info!(
        "account {} deleted along with {} task(s)",
        caller_id,
        tasks_removed
    );
    Ok(tasks_removed)
}
