use std::sync::{Arc, Mutex};

use cq_client::{Error, Method, Object, QueryExecutor, RemoteError, Response, Transport};
use cq_core::{Constraint, Query};
use serde_json::{json, Map, Value as JsonValue};

/// Replays one body for every request and keeps the last parameters sent.
struct Replay {
    body: JsonValue,
    last: Mutex<Option<(String, Map<String, JsonValue>)>>,
}

impl Replay {
    fn new(body: JsonValue) -> Arc<Self> {
        Arc::new(Self {
            body,
            last: Mutex::new(None),
        })
    }

    fn last(&self) -> (String, Map<String, JsonValue>) {
        self.last.lock().unwrap().clone().expect("no request sent")
    }
}

impl Transport for Replay {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        parameters: Option<&Map<String, JsonValue>>,
    ) -> Result<Response, RemoteError> {
        assert_eq!(method, Method::Get);
        *self.last.lock().unwrap() = Some((
            endpoint.to_owned(),
            parameters.cloned().unwrap_or_default(),
        ));
        Ok(Response::new(self.body.clone()))
    }
}

#[test]
fn combined_query_reaches_the_wire_as_one_predicate() {
    let replay = Replay::new(json!({"results": [{"objectId": "1"}, {"objectId": "2"}]}));
    let executor = QueryExecutor::new(replay.clone());

    let mut open = Query::new("Ticket");
    open.where_key("status", Constraint::EqualTo("open".into()));
    let mut urgent = Query::new("Ticket");
    urgent.where_key("priority", Constraint::GreaterThanOrEqualTo(3.into()));

    let mut either = open.logic_or(&urgent).unwrap();
    either.where_key("updatedAt", Constraint::Descending).set_limit(50);

    let tickets: Vec<Object> = executor.find(&either).unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[1].class_name(), "Ticket");

    let (endpoint, parameters) = replay.last();
    assert_eq!(endpoint, "classes/Ticket");
    let predicate: JsonValue = serde_json::from_str(parameters["where"].as_str().unwrap()).unwrap();
    assert_eq!(
        predicate,
        json!({"$or": [
            {"$and": [{"status": "open"}]},
            {"priority": {"$gte": 3}},
        ]})
    );
    assert_eq!(parameters["order"], json!("-updatedAt"));
    assert_eq!(parameters["limit"], json!(50));
}

#[test]
fn count_reports_service_total() {
    let replay = Replay::new(json!({"count": 42}));
    let executor = QueryExecutor::new(replay.clone());
    let mut query = Query::new("Ticket");
    query.set_limit(7).set_skip(3);

    assert_eq!(executor.count(&query).unwrap(), 42);

    let (_, parameters) = replay.last();
    assert_eq!(parameters["count"], json!(1));
    assert_eq!(parameters["limit"], json!(0));
    assert_eq!(parameters["skip"], json!(3));
}

#[test]
fn mismatched_classes_never_reach_the_executor() {
    let err = Query::new("Ticket").logic_and(&Query::new("User")).unwrap_err();
    let err: Error = err.into();
    assert!(matches!(err, Error::Query(cq_core::Error::InconsistentClass { .. })));
}
