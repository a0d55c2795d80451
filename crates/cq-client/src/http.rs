//! # HTTP Transport
//!
//! Blocking [`Transport`] over `reqwest`. GET and DELETE parameters travel in
//! the query string; POST and PUT parameters as a JSON body.
//!
//! The blocking client must not be created or used from inside an async
//! context. The executor's async variants run it on the worker pool's
//! blocking threads, which is safe.

use serde_json::{Map, Value as JsonValue};

use crate::config::ClientConfig;
use crate::error::{Error, RemoteError};
use crate::transport::{Method, Response, Transport};

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        parameters: Option<&Map<String, JsonValue>>,
    ) -> Result<Response, RemoteError> {
        let url = self.config.url_for(endpoint);
        let request_id = uuid::Uuid::new_v4().as_simple().to_string();
        tracing::debug!("{} {} (request {})", method, url, request_id);

        let mut request = self
            .client
            .request(method.into(), &url)
            .header("X-App-Id", &self.config.app_id)
            .header("X-App-Key", &self.config.app_key)
            .header("X-Request-Id", &request_id);
        if let Some(token) = &self.config.session_token {
            request = request.header("X-Session-Token", token);
        }
        if let Some(parameters) = parameters {
            request = match method {
                Method::Get | Method::Delete => request.query(&query_pairs(parameters)),
                Method::Post | Method::Put => request.json(parameters),
            };
        }

        let response = request
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let decoded = decode_response(status, &body);
        if let Err(err) = &decoded {
            tracing::warn!("Request {} to {} failed: {}", request_id, url, err);
        }
        decoded
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// Flatten parameters into query-string pairs. Strings pass through
/// verbatim; anything else is rendered as JSON.
fn query_pairs(parameters: &Map<String, JsonValue>) -> Vec<(String, String)> {
    parameters
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}

/// Turn a status and body into a [`Response`], decoding the service error
/// envelope `{"code": n, "error": "..."}` on failure statuses.
fn decode_response(status: u16, body: &str) -> Result<Response, RemoteError> {
    let parsed = if body.trim().is_empty() {
        Ok(JsonValue::Object(Map::new()))
    } else {
        serde_json::from_str::<JsonValue>(body)
    };

    if (200..300).contains(&status) {
        return parsed
            .map(Response::new)
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()));
    }

    let envelope = parsed.unwrap_or(JsonValue::Null);
    let code = envelope
        .get("code")
        .and_then(JsonValue::as_i64)
        .unwrap_or_else(|| i64::from(status));
    let message = envelope
        .get("error")
        .and_then(JsonValue::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| body.trim().to_owned());

    Err(RemoteError::Service {
        status,
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one HTTP exchange on a loopback port. Yields the base URL and a
    /// channel carrying the raw request head (lowercased) and body.
    fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let reply = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let lower = line.to_ascii_lowercase();
                if let Some(length) = lower.strip_prefix("content-length:") {
                    content_length = length.trim().parse().unwrap();
                }
                head.push_str(&lower);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            reader.get_mut().write_all(reply.as_bytes()).unwrap();
            let _ = tx.send((head, String::from_utf8(request_body).unwrap()));
        });

        (base_url, rx)
    }

    fn transport(base_url: &str) -> HttpTransport {
        let mut config = ClientConfig::new(base_url, "app", "key");
        config.session_token = Some("token".into());
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn test_get_sends_headers_and_query_string() {
        let (base_url, rx) = serve_once("200 OK", r#"{"results": [{"objectId": "a"}]}"#);
        let mut parameters = Map::new();
        parameters.insert("className".into(), json!("Todo"));
        parameters.insert("limit".into(), json!(1));

        let response = transport(&base_url)
            .request(Method::Get, "classes/Todo", Some(&parameters))
            .unwrap();

        assert_eq!(response.results().unwrap().len(), 1);
        let (head, body) = rx.recv().unwrap();
        assert!(head.starts_with("get /1.1/classes/todo?classname=todo&limit=1 http/1.1"));
        assert!(head.contains("x-app-id: app\r\n"));
        assert!(head.contains("x-app-key: key\r\n"));
        assert!(head.contains("x-session-token: token\r\n"));
        assert!(head.contains("x-request-id: "));
        assert!(body.is_empty());
    }

    #[test]
    fn test_post_sends_json_body() {
        let (base_url, rx) = serve_once("201 Created", r#"{"objectId": "new"}"#);
        let mut parameters = Map::new();
        parameters.insert("title".into(), json!("write tests"));

        let response = transport(&base_url)
            .request(Method::Post, "classes/Todo", Some(&parameters))
            .unwrap();

        assert_eq!(response.value(), &json!({"objectId": "new"}));
        let (head, body) = rx.recv().unwrap();
        assert!(head.starts_with("post /1.1/classes/todo http/1.1"));
        assert!(head.contains("content-type: application/json"));
        assert_eq!(body, r#"{"title":"write tests"}"#);
    }

    #[test]
    fn test_service_error_surfaces_from_request() {
        let (base_url, _rx) =
            serve_once("404 Not Found", r#"{"code": 101, "error": "Class not found"}"#);

        let err = transport(&base_url)
            .request(Method::Get, "classes/Missing", None)
            .unwrap_err();

        assert_eq!(
            err,
            RemoteError::Service {
                status: 404,
                code: 101,
                message: "Class not found".into(),
            }
        );
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = transport(&base_url)
            .request(Method::Delete, "classes/Todo/a", None)
            .unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }

    #[test]
    fn test_query_pairs_keep_strings_verbatim() {
        let mut parameters = Map::new();
        parameters.insert("where".into(), json!(r#"{"a":1}"#));
        parameters.insert("limit".into(), json!(10));
        parameters.insert("className".into(), json!("Todo"));

        let pairs = query_pairs(&parameters);
        assert_eq!(
            pairs,
            vec![
                ("where".to_string(), r#"{"a":1}"#.to_string()),
                ("limit".to_string(), "10".to_string()),
                ("className".to_string(), "Todo".to_string()),
            ]
        );
    }

    #[test]
    fn test_success_body_is_decoded() {
        let response = decode_response(200, r#"{"results": []}"#).unwrap();
        assert_eq!(response.value(), &json!({"results": []}));
        assert_eq!(decode_response(204, "").unwrap().value(), &json!({}));
    }

    #[test]
    fn test_success_with_garbage_is_malformed() {
        let err = decode_response(200, "<html>").unwrap_err();
        assert!(matches!(err, RemoteError::MalformedResponse(_)));
    }

    #[test]
    fn test_error_envelope() {
        let err = decode_response(404, r#"{"code": 101, "error": "Class not found"}"#).unwrap_err();
        assert_eq!(
            err,
            RemoteError::Service {
                status: 404,
                code: 101,
                message: "Class not found".into(),
            }
        );
    }

    #[test]
    fn test_error_without_envelope_uses_status() {
        let err = decode_response(502, "Bad Gateway\n").unwrap_err();
        assert_eq!(
            err,
            RemoteError::Service {
                status: 502,
                code: 502,
                message: "Bad Gateway".into(),
            }
        );
    }
}
