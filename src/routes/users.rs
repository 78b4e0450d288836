use crate::{
    auth::AuthenticatedUserId,
    config::Config,
    error::AppError,
    models::user::{AvatarUrlRequest, PasswordRequest, UpdateNameRequest},
    models::UserProfile,
    services::{avatars, tasks, users},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Rename the caller's account. Re-submitting the current name is an error.
#[put("/name")]
pub async fn update_name(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    name_data: web::Json<UpdateNameRequest>,
) -> Result<impl Responder, AppError> {
    name_data.validate()?;

    let user = users::update_name(&pool, caller.0, &name_data.name).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Check a password against the caller's stored hash.
///
/// A mismatch is a `false` result with a 200 status, so clients can
/// re-prompt without special error handling.
#[post("/password/confirm")]
pub async fn confirm_password(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    password_data: web::Json<PasswordRequest>,
) -> Result<impl Responder, AppError> {
    password_data.validate()?;

    let confirmed = users::confirm_password(&pool, caller.0, &password_data.password).await?;
    Ok(HttpResponse::Ok().json(json!({ "confirmed": confirmed })))
}

/// Replace the caller's password. Re-submitting the current password is an
/// error.
#[put("/password")]
pub async fn update_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    caller: AuthenticatedUserId,
    password_data: web::Json<PasswordRequest>,
) -> Result<impl Responder, AppError> {
    password_data.validate()?;

    users::update_password(&pool, caller.0, &password_data.password, config.bcrypt_cost).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password successfully updated" })))
}

/// Aggregated task counts for the caller.
#[get("/stats")]
pub async fn statistics(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let stats = tasks::stats(&pool, caller.0).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Store the avatar URL handed back by the upload collaborator.
#[put("/avatar")]
pub async fn upload_avatar_url(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    avatar_data: web::Json<AvatarUrlRequest>,
) -> Result<impl Responder, AppError> {
    avatar_data.validate()?;

    let user = avatars::upload_url(&pool, caller.0, &avatar_data.avatar_url).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Delete the caller's avatar. The path id is a defense-in-depth equality
/// check against the authenticated identity.
#[delete("/{id}/avatar")]
pub async fn delete_avatar(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    caller: AuthenticatedUserId,
    target: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = avatars::delete(&pool, &config.uploads_dir, caller.0, target.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Delete the caller's account, cascading to its tasks and avatar.
#[delete("/{id}")]
pub async fn delete_account(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    caller: AuthenticatedUserId,
    target: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let tasks_removed =
        users::delete(&pool, &config.uploads_dir, caller.0, target.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Account successfully deleted",
        "tasks_removed": tasks_removed
    })))
}
