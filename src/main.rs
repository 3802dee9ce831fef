use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use sqlx::PgPool;
use std::io;
use std::sync::Arc;

use taskauth::auth::AuthService;
use taskauth::clock::SystemClock;
use taskauth::config::Config;
use taskauth::routes::{self, health};
use taskauth::store::{
    InMemoryTaskStore, InMemoryUserStore, PgTaskStore, PgUserStore, TaskStore, UserStore,
};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn open_stores(
    database_url: Option<&str>,
) -> io::Result<(Arc<dyn UserStore>, Arc<dyn TaskStore>)> {
    match database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .map_err(|e| startup_error("failed to connect to database", e))?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .map_err(|e| startup_error("failed to run migrations", e))?;
            info!("using PostgreSQL stores");
            Ok((
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgTaskStore::new(pool)),
            ))
        }
        None => {
            warn!("DATABASE_URL not set; data is kept in memory and lost on exit");
            Ok((
                Arc::new(InMemoryUserStore::new()),
                Arc::new(InMemoryTaskStore::new()),
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let (users, tasks) = open_stores(config.database_url.as_deref()).await?;

    let auth = AuthService::new(&config.auth, users, Arc::new(SystemClock))
        .map_err(|e| startup_error("invalid configuration", e))?;
    let auth = web::Data::new(auth);
    let tasks: web::Data<dyn TaskStore> = web::Data::from(tasks);

    info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(auth.clone())
            .app_data(tasks.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
