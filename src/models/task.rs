use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A task row as stored in the database and returned from mutations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub completed: bool,
    /// Optional due date.
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Owning account. Immutable after creation; every query on this table
    /// filters by it.
    pub user_id: i32,
}

/// Input for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub subtitle: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
}

/// The projection returned by the list endpoint: the task's public fields,
/// without the owner id (listing is already scoped to the caller).
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Which completion state the `tab` parameter selects.
pub const TAB_ALL: i32 = 0;
pub const TAB_ACTIVE: i32 = 1;
pub const TAB_COMPLETED: i32 = 2;

/// Query parameters for listing tasks. All optional; out-of-range values
/// fall back to the documented defaults rather than erroring.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub tab: Option<i32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<i32>,
    pub search: Option<String>,
}

impl ListParams {
    /// Tasks per page; defaults to 6 when absent or non-positive.
    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l > 0).unwrap_or(6)
    }

    /// 1-based page number; defaults to 1 when absent or non-positive.
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// Number of rows to skip for the requested page. Saturates instead of
    /// overflowing, so an absurd page number yields an empty result rather
    /// than a panic.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Completion filter derived from the tab: active-only, completed-only,
    /// or none.
    pub fn completed_filter(&self) -> Option<bool> {
        match self.tab.unwrap_or(TAB_ALL) {
            TAB_ACTIVE => Some(false),
            TAB_COMPLETED => Some(true),
            _ => None,
        }
    }

    /// Sort column, restricted to a whitelist so the value can be spliced
    /// into SQL. Unknown fields fall back to the creation timestamp.
    pub fn sort_column(&self) -> &'static str {
        match self.sort_field.as_deref() {
            Some("deadline") => "deadline",
            Some("title") => "title",
            _ => "created_at",
        }
    }

    /// Sort direction: +1 is ascending, anything else (including the
    /// default) descending.
    pub fn sort_direction(&self) -> &'static str {
        match self.sort_order {
            Some(1) => "ASC",
            _ => "DESC",
        }
    }
}

/// One page of list results plus the pagination bookkeeping.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Number of tasks matching the filter across all pages.
    pub total_count: i64,
    /// `ceil(total_count / limit)`.
    pub total_pages: i64,
    /// Number of tasks actually returned on this page.
    pub page_count: i64,
    pub tasks: Vec<TaskSummary>,
}

/// Aggregated task counts for one account, from a single snapshot query.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    /// Tasks not yet completed.
    pub active: i64,
    /// Active tasks whose deadline is strictly in the past.
    pub overdue: i64,
}
