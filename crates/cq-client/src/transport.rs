//! # Transport Boundary
//!
//! The executor talks to the service only through [`Transport`]. The HTTP
//! implementation lives in [`crate::http`]; tests substitute canned
//! responses.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A decoded service response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    value: JsonValue,
}

impl Response {
    pub fn new(value: JsonValue) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Class name reported by the service for the result list, if any.
    pub fn class_name(&self) -> Option<&str> {
        self.value.get("className").and_then(JsonValue::as_str)
    }

    /// Object-shaped entries of `results`, in response order. A missing list
    /// is treated as empty.
    pub fn results(&self) -> Result<Vec<&Map<String, JsonValue>>, RemoteError> {
        let entries = match self.value.get("results") {
            None | Some(JsonValue::Null) => return Ok(Vec::new()),
            Some(JsonValue::Array(entries)) => entries,
            Some(other) => {
                return Err(RemoteError::MalformedResponse(format!(
                    "`results` is not a list: {}",
                    other
                )))
            }
        };

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let object = entry.as_object();
                if object.is_none() {
                    tracing::warn!("Skipping non-object result entry: {}", entry);
                }
                object
            })
            .collect())
    }

    pub fn count(&self) -> Result<u64, RemoteError> {
        self.value
            .get("count")
            .and_then(JsonValue::as_u64)
            .ok_or_else(|| RemoteError::MalformedResponse("missing integer `count`".into()))
    }
}

/// Sends one request to the service.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        parameters: Option<&Map<String, JsonValue>>,
    ) -> Result<Response, RemoteError>;
}

/// Endpoint path serving objects of `class_name`.
pub fn endpoint(class_name: &str) -> String {
    match class_name {
        "_User" => "users".into(),
        "_Role" => "roles".into(),
        "_Installation" => "installations".into(),
        other => format!("classes/{}", other),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// A request as seen by [`CannedTransport`].
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: Method,
        pub endpoint: String,
        pub parameters: Map<String, JsonValue>,
    }

    type Handler = Box<dyn Fn(&Recorded) -> Result<Response, RemoteError> + Send + Sync>;

    /// In-memory transport answering every request through `handler`.
    pub struct CannedTransport {
        handler: Handler,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl CannedTransport {
        pub fn new(
            handler: impl Fn(&Recorded) -> Result<Response, RemoteError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(value: JsonValue) -> Self {
            Self::new(move |_| Ok(Response::new(value.clone())))
        }

        pub fn recorded(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for CannedTransport {
        fn request(
            &self,
            method: Method,
            endpoint: &str,
            parameters: Option<&Map<String, JsonValue>>,
        ) -> Result<Response, RemoteError> {
            let recorded = Recorded {
                method,
                endpoint: endpoint.to_owned(),
                parameters: parameters.cloned().unwrap_or_default(),
            };
            self.requests.lock().unwrap().push(recorded.clone());
            (self.handler)(&recorded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_for_reserved_classes() {
        assert_eq!(endpoint("_User"), "users");
        assert_eq!(endpoint("_Role"), "roles");
        assert_eq!(endpoint("_Installation"), "installations");
        assert_eq!(endpoint("Todo"), "classes/Todo");
    }

    #[test]
    fn test_results_skip_non_objects() {
        let response = Response::new(json!({"results": [{"a": 1}, 3, {"b": 2}]}));
        let results = response.results().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["b"], json!(2));
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(Response::new(json!({})).results().unwrap().is_empty());
        assert!(Response::new(json!({"results": "x"})).results().is_err());
    }

    #[test]
    fn test_count_requires_integer() {
        assert_eq!(Response::new(json!({"count": 42})).count().unwrap(), 42);
        assert!(Response::new(json!({"count": "42"})).count().is_err());
    }
}
