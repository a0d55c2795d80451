//! # cq-core: Query Construction for the Document Service
//!
//! Application code describes a search as a sequence of typed
//! [`Constraint`]s applied to named fields of a remote class. This crate
//! compiles those constraints into the service's predicate document and the
//! request parameters that carry it. Nothing here performs I/O; see
//! `cq-client` for execution.
//!
//! ```
//! use cq_core::{Constraint, Query};
//!
//! let mut query = Query::new("Todo");
//! query
//!     .where_key("priority", Constraint::GreaterThan(2.into()))
//!     .where_key("title", Constraint::PrefixedBy("v1.".into()))
//!     .where_key("createdAt", Constraint::Descending);
//! query.set_limit(10);
//!
//! let parameters = query.to_request_parameters().unwrap();
//! assert_eq!(parameters["order"], "-createdAt");
//! ```

pub mod constraint;
pub mod error;
pub mod query;
pub mod value;

pub use constraint::{Constraint, Distance, DistanceUnit};
pub use error::{EncodeError, Error, Result};
pub use query::Query;
pub use value::{Document, GeoPoint, ObjectRef, Value};
