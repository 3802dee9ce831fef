pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskQuery};
pub use user::{User, UserResponse};
