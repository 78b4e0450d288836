pub mod task;
pub mod user;

pub use task::{ListParams, Task, TaskInput, TaskPage, TaskStats, TaskSummary};
pub use user::{User, UserProfile};
