//! Persistence interfaces for users and tasks.
//!
//! The authentication core and the route handlers only see the `UserStore`
//! and `TaskStore` traits. `postgres` backs them with `sqlx`; `memory` keeps
//! everything in-process for development and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{Task, TaskQuery, User};

pub use memory::{InMemoryTaskStore, InMemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    DuplicateKey(String),
    /// Connectivity or any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::DuplicateKey(msg) => write!(f, "duplicate key: {}", msg),
            StoreError::Backend(msg) => write!(f, "store failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// User records keyed by id, with usernames unique across all users.
///
/// `insert` must enforce username uniqueness atomically: of two concurrent
/// inserts with the same username exactly one succeeds and the other gets
/// `StoreError::DuplicateKey`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
}

/// Tasks, always addressed together with their owner.
///
/// A task belonging to another owner behaves exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), StoreError>;
    /// Newest first.
    async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;
    async fn find(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Task>, StoreError>;
    /// Returns `false` when no task with this id and owner exists.
    async fn update(&self, task: &Task) -> Result<bool, StoreError>;
    /// Returns `false` when no task with this id and owner exists.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;
}
