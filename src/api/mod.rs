//! HTTP API
//!
//! Read-only JSON endpoints over the search pipeline.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
