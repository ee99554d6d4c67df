//! Procgate Services Layer
//!
//! This crate sits between the HTTP surface and the blocking invocation
//! engine in `procgate-core`.
//!
//! # Architecture
//!
//! ```text
//! HTTP Layer (procgate-server)
//!     ↓
//! Service Layer (procgate-services) ← This crate
//!     ↓
//! Core (procgate-core) + Driver (procgate-driver-oracle)
//! ```
//!
//! # Services
//!
//! - [`ProcedureService`] - Runs calls on the blocking pool with deadlines and cancellation
//! - [`ProcedureGateway`] - The async seam the HTTP layer depends on

mod error;
mod procedure_service;

pub use error::{ServiceError, ServiceResult};
pub use procedure_service::{DEFAULT_CALL_TIMEOUT, ProcedureGateway, ProcedureService};
