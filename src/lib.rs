pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod http; // REST API
pub mod infra;
pub mod logging;
pub mod model;
pub mod repository;
pub mod server;
pub mod service;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{Result, ServerError};
pub use server::ApiServer;
