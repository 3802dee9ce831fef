#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use taskauth::auth::AuthService;
use taskauth::clock::FixedClock;
use taskauth::config::AuthConfig;
use taskauth::routes::{self, health};
use taskauth::store::{InMemoryTaskStore, InMemoryUserStore, TaskStore};

pub const SECRET: &str = "integration-test-secret";

/// Application state backed by in-memory stores and a hand-driven clock.
pub struct TestContext {
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<dyn TaskStore>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new() -> Self {
        let config = AuthConfig {
            hash_memory_kib: 8,
            hash_iterations: 1,
            ..AuthConfig::with_secret(SECRET)
        };
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let auth = AuthService::new(&config, Arc::new(InMemoryUserStore::new()), clock.clone())
            .expect("test auth config is valid");
        let tasks: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());

        Self {
            auth: web::Data::new(auth),
            tasks: web::Data::from(tasks),
            clock,
        }
    }

    pub async fn init_app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
    {
        test::init_service(
            App::new()
                .app_data(self.auth.clone())
                .app_data(self.tasks.clone())
                .service(health::health)
                .configure(routes::config),
        )
        .await
    }
}

/// Sends `req` and returns the status with the body parsed as JSON
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn register<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

/// Registers and logs in, returning the access token.
pub async fn token_for<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = register(app, username, password).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"]
        .as_str()
        .expect("login returns access_token")
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
