//! Procgate Core - Stored procedure invocation engine
//!
//! This crate turns a loosely-typed procedure call description into a
//! database call and back into a JSON-safe result. It defines:
//!
//! - `ProcedureParameter` - caller-supplied name, declared type, direction and value
//! - Parameter binder - converts parameters into direction-tagged `BoundArgument`s
//! - Invoker - builds and runs the `BEGIN name(:a, :b); END;` block
//! - Result normalizer - reads scalars and cursors into an `InvocationResult`
//! - `ProcedureConnection` / `CallableStatement` - traits implemented by drivers
//! - `CallContext` - cancellation and deadline for one call

mod binder;
mod connection;
mod context;
mod error;
mod invoker;
mod normalizer;
mod parameter;
mod types;

pub use binder::*;
pub use connection::*;
pub use context::*;
pub use error::*;
pub use invoker::*;
pub use normalizer::*;
pub use parameter::*;
pub use types::*;

#[cfg(test)]
mod test_support;



#[cfg(test)]
mod normalizer_tests;
