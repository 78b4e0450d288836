//!
//! Ownership-scoped task store and query engine.
//!
//! Every statement here carries `user_id = $owner` in its filter. For
//! mutations that is also the authorization check: zero matched rows means
//! the task is absent OR owned by someone else, and both collapse to one
//! `Forbidden` error so a non-owner can never probe for existence.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::task::{ListParams, Task, TaskInput, TaskPage, TaskStats, TaskSummary};

const TASK_COLUMNS: &str = "id, title, subtitle, description, completed, deadline, created_at, user_id";
const SUMMARY_COLUMNS: &str = "id, title, subtitle, description, completed, deadline, created_at";

const OWNERSHIP_DENIED: &str = "Task not found or not owned by caller";

/// Escapes ILIKE wildcards so a search term is matched literally. Without
/// this, a search for "%" would match every title.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Inserts a task owned by `owner_id`.
pub async fn create(pool: &PgPool, owner_id: i32, input: TaskInput) -> Result<Task, AppError> {
    input.validate()?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, subtitle, description, completed, deadline, user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&input.title)
    .bind(&input.subtitle)
    .bind(&input.description)
    .bind(input.completed)
    .bind(input.deadline)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(task)
}

/// Updates a task, but only the row matching `(id, owner)`.
pub async fn update(
    pool: &PgPool,
    owner_id: i32,
    task_id: Uuid,
    input: TaskInput,
) -> Result<Task, AppError> {
    input.validate()?;

    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET title = $1, subtitle = $2, description = $3, completed = $4, deadline = $5
         WHERE id = $6 AND user_id = $7
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&input.title)
    .bind(&input.subtitle)
    .bind(&input.description)
    .bind(input.completed)
    .bind(input.deadline)
    .bind(task_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| AppError::Forbidden(OWNERSHIP_DENIED.into()))
}

/// Deletes a task, same ownership-scoped match as `update`.
pub async fn delete(pool: &PgPool, owner_id: i32, task_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Forbidden(OWNERSHIP_DENIED.into()));
    }
    Ok(())
}

/// Filter + search + sort + paginate over one owner's tasks.
///
/// The filter is owner-equality AND the tab's completion state AND an
/// optional case-insensitive title substring. A page past the end returns
/// an empty list with the true totals; that is the contract, not an error.
pub async fn list(pool: &PgPool, owner_id: i32, params: &ListParams) -> Result<TaskPage, AppError> {
    let limit = params.limit();

    // Owner filter first; the optional conditions are appended with their
    // placeholder numbers, mirrored by the bind calls below.
    let mut filter = String::from("user_id = $1");
    let mut placeholder = 2;

    if params.completed_filter().is_some() {
        filter.push_str(&format!(" AND completed = ${}", placeholder));
        placeholder += 1;
    }
    if params.search.is_some() {
        filter.push_str(&format!(" AND title ILIKE ${}", placeholder));
        placeholder += 1;
    }

    let count_sql = format!("SELECT COUNT(*) FROM tasks WHERE {}", filter);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(owner_id);
    if let Some(completed) = params.completed_filter() {
        count_query = count_query.bind(completed);
    }
    if let Some(search) = &params.search {
        count_query = count_query.bind(format!("%{}%", escape_like(search)));
    }
    let total_count = count_query.fetch_one(pool).await?;

    // sort_column/sort_direction come from a whitelist, never from raw input.
    let page_sql = format!(
        "SELECT {} FROM tasks WHERE {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        SUMMARY_COLUMNS,
        filter,
        params.sort_column(),
        params.sort_direction(),
        placeholder,
        placeholder + 1
    );

    let mut page_query = sqlx::query_as::<_, TaskSummary>(&page_sql).bind(owner_id);
    if let Some(completed) = params.completed_filter() {
        page_query = page_query.bind(completed);
    }
    if let Some(search) = &params.search {
        page_query = page_query.bind(format!("%{}%", escape_like(search)));
    }
    let tasks = page_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

    Ok(TaskPage {
        total_count,
        total_pages: (total_count + limit - 1) / limit,
        page_count: tasks.len() as i64,
        tasks,
    })
}

/// Aggregated counts over one owner's tasks.
///
/// A single statement, so the four counts come from one consistent
/// snapshot of the table.
pub async fn stats(pool: &PgPool, owner_id: i32) -> Result<TaskStats, AppError> {
    let stats = sqlx::query_as::<_, TaskStats>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE completed) AS completed,
                COUNT(*) FILTER (WHERE NOT completed) AS active,
                COUNT(*) FILTER (WHERE NOT completed
                                 AND deadline IS NOT NULL
                                 AND deadline < NOW()) AS overdue
         FROM tasks WHERE user_id = $1",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
