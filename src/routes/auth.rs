use crate::{
    auth::{
        AuthResponse, AuthenticatedUserId, LoginRequest, RegisterRequest, ResetConfirmRequest,
        ResetRequest, TokenIssuer,
    },
    config::Config,
    error::AppError,
    mailer::ResetDelivery,
    models::UserProfile,
    services::users,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new account.
///
/// Creates the account and returns its profile with a fresh session token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenIssuer>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let (user, token) = users::register(
        &pool,
        &tokens,
        config.bcrypt_cost,
        register_data.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

/// Login with email and password.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenIssuer>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let (user, token) = users::login(&pool, &tokens, &login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

/// Login by token: resolves the bearer token to the account profile.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = users::find_by_id(&pool, caller.0).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Request a password-reset email.
///
/// Responds identically whether or not the email names an account.
#[post("/password-reset")]
pub async fn request_password_reset(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenIssuer>,
    config: web::Data<Config>,
    mailer: web::Data<dyn ResetDelivery>,
    reset_data: web::Json<ResetRequest>,
) -> Result<impl Responder, AppError> {
    reset_data.validate()?;

    users::request_password_reset(
        &pool,
        &tokens,
        mailer.into_inner(),
        &config.app_base_url,
        &reset_data.email,
    )
    .await?;

    Ok(HttpResponse::Accepted().json(json!({
        "message": "If the email belongs to an account, a reset link has been sent"
    })))
}

/// Apply a password reset using the credential from the emailed link.
#[post("/password-reset/confirm")]
pub async fn apply_password_reset(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenIssuer>,
    config: web::Data<Config>,
    reset_data: web::Json<ResetConfirmRequest>,
) -> Result<impl Responder, AppError> {
    reset_data.validate()?;

    let user = users::apply_password_reset(
        &pool,
        &tokens,
        config.bcrypt_cost,
        &reset_data.token,
        &reset_data.password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Password successfully updated for {}", user.name)
    })))
}
