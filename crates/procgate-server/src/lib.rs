//! Procgate HTTP server
//!
//! Exposes the procedure gateway over HTTP:
//!
//! - `POST /api/v1/procedures/call` invokes a stored procedure
//! - `GET /api/v1/procedures/info` lists a procedure's declared arguments
//! - `GET /health` reports liveness
//!
//! Every response uses the `{"message", "status", "data"}` envelope.

pub mod config;
pub mod handlers;
pub mod logging;
pub mod request;
pub mod response;
pub mod router;

pub use config::ServerConfig;
pub use handlers::AppState;
pub use router::{build_router, serve};
