use thiserror::Error;

mod auth;
mod database;
mod http;
mod server;

pub use auth::Auth;
pub use database::{Database, DbPoolConfig};
pub use http::Http;
pub use server::{Server, TextProcessor};

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
