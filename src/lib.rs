#![doc = "The `taskauth` library crate."]
#![doc = ""]
#![doc = "Password registration and login, signed bearer tokens, and a per-user task"]
#![doc = "resource, served over actix-web. The binary (`main.rs`) reads configuration,"]
#![doc = "picks a store backend and mounts `routes::config`."]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use error::AppError;
