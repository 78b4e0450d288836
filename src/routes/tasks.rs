use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{ListParams, TaskInput},
    services::tasks,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// List the caller's tasks with filtering, search, sorting, and pagination.
///
/// ## Query parameters (all optional):
/// - `limit`: tasks per page, default 6.
/// - `page`: 1-based page number, default 1.
/// - `tab`: 0 = all, 1 = active only, 2 = completed only.
/// - `sortField`: one of `createdAt`, `deadline`, `title`.
/// - `sortOrder`: 1 ascending, -1 descending (default).
/// - `search`: case-insensitive substring match on the title.
///
/// A page past the last one returns an empty list, not an error.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    params: web::Query<ListParams>,
) -> Result<impl Responder, AppError> {
    let page = tasks::list(&pool, caller.0, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Create a task owned by the caller.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks::create(&pool, caller.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Update a task. Only the row matching both the id and the caller's
/// ownership is touched; anything else is `Forbidden`.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks::update(&pool, caller.0, task_id.into_inner(), task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Delete a task, with the same ownership-scoped match as update.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    caller: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks::delete(&pool, caller.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task successfully deleted" })))
}
