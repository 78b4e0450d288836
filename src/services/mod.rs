pub mod avatars;
pub mod tasks;
pub mod users;
