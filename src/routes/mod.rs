pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Mounts the auth and task routes.
///
/// Expects `web::Data<AuthService>` and `web::Data<dyn TaskStore>` on the app.
/// `/auth/me` and everything under `/tasks` sit behind `AuthMiddleware`.
/// Body, query and path extraction failures are answered as JSON 400s.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::verify_token)
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::me)),
            ),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
