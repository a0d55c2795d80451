//! # cq-client: Query Execution over HTTP
//!
//! Sends compiled [`Query`] parameters to the document service and maps the
//! response envelope back into typed objects or a count.
//!
//! - [`QueryExecutor::find`] / [`QueryExecutor::count`] block for the round trip.
//! - [`QueryExecutor::find_async`] / [`QueryExecutor::count_async`] run on a
//!   shared background pool and hand back a [`Task`].
//!
//! Transport and object mapping are traits ([`Transport`], [`RemoteObject`])
//! so either side can be swapped out.

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod object;
pub mod pool;
pub mod transport;

pub use config::ClientConfig;
pub use error::{Error, RemoteError, Result};
pub use executor::QueryExecutor;
pub use http::HttpTransport;
pub use object::{Object, RemoteObject};
pub use pool::Task;
pub use transport::{Method, Response, Transport};

pub use cq_core::{self, Constraint, Query};
