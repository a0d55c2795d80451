//! # Query Executor
//!
//! Compiles a [`Query`] to request parameters, sends it through a
//! [`Transport`], and maps the response envelope into objects or a count.
//! Each call moves through `Pending → {Succeeded, Failed}`; failures always
//! come back as an `Err` value, including from the async variants.

use std::sync::Arc;

use cq_core::Query;
use serde_json::{Map, Value as JsonValue};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpTransport;
use crate::object::RemoteObject;
use crate::pool::{self, Task};
use crate::transport::{self, Method, Response, Transport};

#[derive(Clone)]
pub struct QueryExecutor {
    transport: Arc<dyn Transport>,
}

impl QueryExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Executor backed by [`HttpTransport`].
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Fetch all objects matching `query`, in the service's order.
    ///
    /// Objects take the class name reported by the response, falling back to
    /// the query's own.
    pub fn find<T: RemoteObject>(&self, query: &Query) -> Result<Vec<T>> {
        let parameters = query.to_request_parameters()?;
        let response = self.fetch(query, &parameters)?;

        let class_name = response.class_name().unwrap_or_else(|| query.class_name());
        let objects = response
            .results()?
            .into_iter()
            .map(|document| -> Result<T> {
                let mut object = T::materialize(class_name);
                object.apply(document)?;
                Ok(object)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Query on '{}' returned {} objects", class_name, objects.len());
        Ok(objects)
    }

    /// The first object matching `query`. Sends `limit=1`; the caller's
    /// query is left untouched.
    pub fn first<T: RemoteObject>(&self, query: &Query) -> Result<Option<T>> {
        let mut limited = query.clone();
        limited.set_limit(1);
        Ok(self.find(&limited)?.into_iter().next())
    }

    /// Number of objects matching `query`. Always sends `count=1, limit=0`,
    /// whatever limit the query carries.
    pub fn count(&self, query: &Query) -> Result<u64> {
        let mut parameters = query.to_request_parameters()?;
        parameters.insert("count".into(), 1.into());
        parameters.insert("limit".into(), 0.into());

        let response = self.fetch(query, &parameters)?;
        let count = response.count()?;
        tracing::debug!("Count on '{}' returned {}", query.class_name(), count);
        Ok(count)
    }

    /// [`find`](Self::find) on the background pool.
    pub fn find_async<T>(&self, query: Query) -> Task<Vec<T>>
    where
        T: RemoteObject + Send + 'static,
    {
        let executor = self.clone();
        pool::spawn(move || executor.find(&query))
    }

    /// [`count`](Self::count) on the background pool.
    pub fn count_async(&self, query: Query) -> Task<u64> {
        let executor = self.clone();
        pool::spawn(move || executor.count(&query))
    }

    /// [`find`](Self::find) on the background pool; `completion` runs on the
    /// worker thread once the round trip ends.
    pub fn find_with<T, C>(&self, query: Query, completion: C)
    where
        T: RemoteObject + Send + 'static,
        C: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        let executor = self.clone();
        pool::spawn_with(move || executor.find(&query), completion);
    }

    /// [`count`](Self::count) on the background pool, reporting to `completion`.
    pub fn count_with<C>(&self, query: Query, completion: C)
    where
        C: FnOnce(Result<u64>) + Send + 'static,
    {
        let executor = self.clone();
        pool::spawn_with(move || executor.count(&query), completion);
    }

    fn fetch(&self, query: &Query, parameters: &Map<String, JsonValue>) -> Result<Response> {
        let endpoint = transport::endpoint(query.class_name());
        self.transport
            .request(Method::Get, &endpoint, Some(parameters))
            .map_err(|err| {
                tracing::warn!("Query on '{}' failed: {}", endpoint, err);
                err.into()
            })
    }
}
