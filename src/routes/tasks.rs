use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
    store::TaskStore,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `done` (optional): only tasks whose `done` flag matches.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn TaskStore>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = store.list(user.0.id, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: malformed body or a field outside its bounds.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn TaskStore>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.0.id);
    store.create(&task).await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    match store.find(task_id.into_inner(), user.0.id).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(not_found()),
    }
}

/// Replaces a task's title, description and done flag.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: invalid input.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[put("/{id}")]
pub async fn update_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut task = store
        .find(task_id.into_inner(), user.0.id)
        .await?
        .ok_or_else(not_found)?;
    task.apply(task_data.into_inner());

    if !store.update(&task).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !store.delete(task_id.into_inner(), user.0.id).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
