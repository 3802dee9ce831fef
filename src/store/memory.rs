use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{Task, TaskQuery, User};

/// Process-local user store.
///
/// Both maps sit behind one lock so the username check and the insert happen
/// as a single step.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Users>,
}

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<Uuid, User>,
    id_by_username: HashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.inner.read().await;
        Ok(users
            .id_by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.inner.write().await;
        if users.id_by_username.contains_key(&user.username) {
            return Err(StoreError::DuplicateKey(format!(
                "username {:?} already exists",
                user.username
            )));
        }
        if users.by_id.contains_key(&user.id) {
            return Err(StoreError::DuplicateKey(format!("id {} already exists", user.id)));
        }
        users.id_by_username.insert(user.username.clone(), user.id);
        users.by_id.insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::DuplicateKey(format!("task {} already exists", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn list(&self, owner_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| query.done.map_or(true, |done| t.done == done))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn update(&self, task: &Task) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(existing) if existing.owner_id == task.owner_id => {
                *existing = task.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&id) {
            Some(existing) if existing.owner_id == owner_id => {
                tasks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;
    use std::sync::Arc;

    fn task_for(owner: Uuid, title: &str, done: bool) -> Task {
        Task::new(
            TaskInput {
                title: title.to_string(),
                description: None,
                done,
            },
            owner,
        )
    }

    #[actix_rt::test]
    async fn test_user_insert_and_lookup() {
        let store = InMemoryUserStore::new();
        let user = User::new("alice", "hash");
        store.insert(&user).await.unwrap();

        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
        assert_eq!(store.find_by_username("Alice").await.unwrap(), None);
        assert_eq!(store.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn test_duplicate_username_is_rejected() {
        let store = InMemoryUserStore::new();
        store.insert(&User::new("alice", "h1")).await.unwrap();

        let err = store.insert(&User::new("alice", "h2")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[actix_rt::test]
    async fn test_concurrent_duplicate_inserts_admit_one() {
        let store = Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(&User::new("racer", "h")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::DuplicateKey(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 1);
    }

    #[actix_rt::test]
    async fn test_tasks_are_scoped_to_owner() {
        let store = InMemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let task = task_for(owner, "mine", false);
        store.create(&task).await.unwrap();

        assert!(store.find(task.id, owner).await.unwrap().is_some());
        assert!(store.find(task.id, stranger).await.unwrap().is_none());
        assert!(!store.delete(task.id, stranger).await.unwrap());

        let mut hijacked = task.clone();
        hijacked.owner_id = stranger;
        assert!(!store.update(&hijacked).await.unwrap());

        assert!(store.delete(task.id, owner).await.unwrap());
        assert!(store.find(task.id, owner).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_list_filters_by_done() {
        let store = InMemoryTaskStore::new();
        let owner = Uuid::new_v4();
        store.create(&task_for(owner, "open", false)).await.unwrap();
        store.create(&task_for(owner, "closed", true)).await.unwrap();
        store.create(&task_for(Uuid::new_v4(), "other", false)).await.unwrap();

        let all = store.list(owner, &TaskQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let closed = store.list(owner, &TaskQuery { done: Some(true) }).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].title, "closed");
    }
}
