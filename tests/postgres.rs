//! Store tests against a real database. Skipped unless `DATABASE_URL` is set.

use dotenv::dotenv;
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use uuid::Uuid;

use taskauth::models::{Task, TaskInput, TaskQuery, User};
use taskauth::store::{PgTaskStore, PgUserStore, StoreError, TaskStore, UserStore};

async fn pool() -> Option<PgPool> {
    dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping postgres store test");
            return None;
        }
    };
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

async fn insert_user(users: &PgUserStore, prefix: &str) -> User {
    let user = User::new(unique_username(prefix), "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA");
    users.insert(&user).await.expect("Failed to insert user");
    user
}

fn input(title: &str, done: bool) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        description: None,
        done,
    }
}

#[actix_rt::test]
async fn test_duplicate_username_is_duplicate_key() {
    let Some(pool) = pool().await else { return };
    let users = PgUserStore::new(pool);

    let first = insert_user(&users, "dup").await;
    let second = User::new(first.username.clone(), "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$b3RoZXI");

    let result = users.insert(&second).await;
    assert!(
        matches!(result, Err(StoreError::DuplicateKey(_))),
        "{:?}",
        result
    );
    assert_eq!(users.find_by_id(second.id).await.unwrap(), None);
}

#[actix_rt::test]
async fn test_user_lookups() {
    let Some(pool) = pool().await else { return };
    let users = PgUserStore::new(pool);
    let user = insert_user(&users, "lookup").await;

    let by_name = users.find_by_username(&user.username).await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);
    assert_eq!(by_name.password_hash, user.password_hash);

    let by_id = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, user.username);

    assert_eq!(
        users
            .find_by_username(&user.username.to_uppercase())
            .await
            .unwrap(),
        None
    );
    assert_eq!(users.find_by_id(Uuid::new_v4()).await.unwrap(), None);
}

#[actix_rt::test]
async fn test_tasks_are_scoped_to_their_owner() {
    let Some(pool) = pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let tasks = PgTaskStore::new(pool);
    let owner = insert_user(&users, "owner").await;
    let other = insert_user(&users, "other").await;

    let task = Task::new(input("Private", false), owner.id);
    tasks.create(&task).await.unwrap();

    assert_eq!(tasks.find(task.id, other.id).await.unwrap(), None);
    let found = tasks.find(task.id, owner.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Private");

    let mut hijacked = found.clone();
    hijacked.owner_id = other.id;
    hijacked.apply(input("Hijacked", true));
    assert!(!tasks.update(&hijacked).await.unwrap());

    let mut edited = found.clone();
    edited.apply(input("Edited", true));
    assert!(tasks.update(&edited).await.unwrap());
    let found = tasks.find(task.id, owner.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Edited");
    assert!(found.done);

    assert!(!tasks.delete(task.id, other.id).await.unwrap());
    assert!(tasks.delete(task.id, owner.id).await.unwrap());
    assert_eq!(tasks.find(task.id, owner.id).await.unwrap(), None);
}

#[actix_rt::test]
async fn test_list_filters_by_owner_and_done() {
    let Some(pool) = pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let tasks = PgTaskStore::new(pool);
    let owner = insert_user(&users, "lister").await;
    let other = insert_user(&users, "bystander").await;

    tasks
        .create(&Task::new(input("open", false), owner.id))
        .await
        .unwrap();
    tasks
        .create(&Task::new(input("closed", true), owner.id))
        .await
        .unwrap();
    tasks
        .create(&Task::new(input("not mine", false), other.id))
        .await
        .unwrap();

    let all = tasks.list(owner.id, &TaskQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|t| t.owner_id == owner.id));

    let done = tasks
        .list(owner.id, &TaskQuery { done: Some(true) })
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].title, "closed");
}
