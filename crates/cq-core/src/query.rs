//! # Query Builder
//!
//! [`Query`] is a plain mutable value: constraints mutate it in place and
//! [`Query::compile`] snapshots it into the wire document. Combining two
//! queries with [`Query::logic_and`] / [`Query::logic_or`] copies both
//! constraint documents, so later mutation of either operand never leaks
//! into the combined query.
//!
//! A `Query` has no internal locking; do not mutate one from several
//! threads at once.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value as JsonValue};

use crate::constraint::{self, op, Constraint};
use crate::error::{Error, Result};
use crate::value::{encode_document, Document, Value};

#[derive(Debug, Clone)]
pub struct Query {
    class_name: String,
    limit: Option<u64>,
    skip: Option<u64>,
    included_keys: IndexSet<String>,
    selected_keys: IndexSet<String>,
    /// One equality value per field, in first-assignment order.
    equality_table: Document,
    /// Ordering tokens, appended verbatim (see [`Constraint::Ascending`]).
    ordered_keys: Option<String>,
    constraints: Document,
}

impl Query {
    /// Create an empty query over `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            limit: None,
            skip: None,
            included_keys: IndexSet::new(),
            selected_keys: IndexSet::new(),
            equality_table: IndexMap::new(),
            ordered_keys: None,
            constraints: IndexMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_skip(&mut self, skip: u64) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    /// Accumulated ordering string, if any.
    ///
    /// Ordering tokens are appended as-is: `Ascending` on `a` then
    /// `Descending` on `b` yields `"a-b"`. Callers wanting the service's
    /// comma-delimited form supply the comma in the field name.
    pub fn ordered_keys(&self) -> Option<&str> {
        self.ordered_keys.as_deref()
    }

    /// Apply `constraint` to `field`.
    pub fn where_key(&mut self, field: &str, constraint: Constraint) -> &mut Self {
        constraint::apply(self, field, constraint);
        self
    }

    /// New query matching both `self` and `other`.
    pub fn logic_and(&self, other: &Query) -> Result<Query> {
        self.combine(other, op::AND)
    }

    /// New query matching either `self` or `other`.
    pub fn logic_or(&self, other: &Query) -> Result<Query> {
        self.combine(other, op::OR)
    }

    fn combine(&self, other: &Query, operator: &str) -> Result<Query> {
        if self.class_name != other.class_name {
            return Err(Error::InconsistentClass {
                left: self.class_name.clone(),
                right: other.class_name.clone(),
            });
        }

        let operands = vec![
            Value::Object(self.constraints.clone()),
            Value::Object(other.constraints.clone()),
        ];
        let mut combined = Query::new(self.class_name.clone());
        combined
            .constraints
            .insert(operator.to_owned(), Value::Array(operands));
        Ok(combined)
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// The encoded predicate document alone.
    pub fn where_document(&self) -> Result<Map<String, JsonValue>> {
        Ok(encode_document(&self.constraints)?)
    }

    /// Compile into `{className, where?, include?, keys?, order?, limit?, skip?}`.
    /// Unset or empty state is omitted rather than emitted empty.
    pub fn compile(&self) -> Result<Map<String, JsonValue>> {
        let mut dictionary = Map::new();
        dictionary.insert("className".into(), self.class_name.clone().into());

        if !self.constraints.is_empty() {
            dictionary.insert("where".into(), JsonValue::Object(self.where_document()?));
        }
        if !self.included_keys.is_empty() {
            dictionary.insert("include".into(), join_keys(&self.included_keys).into());
        }
        if !self.selected_keys.is_empty() {
            dictionary.insert("keys".into(), join_keys(&self.selected_keys).into());
        }
        if let Some(order) = self.ordered_keys.as_deref().filter(|o| !o.is_empty()) {
            dictionary.insert("order".into(), order.into());
        }
        if let Some(limit) = self.limit {
            dictionary.insert("limit".into(), limit.into());
        }
        if let Some(skip) = self.skip {
            dictionary.insert("skip".into(), skip.into());
        }

        Ok(dictionary)
    }

    /// Like [`compile`](Self::compile), with `where` serialized to a JSON
    /// string for use as a query-string parameter.
    pub fn to_request_parameters(&self) -> Result<Map<String, JsonValue>> {
        let mut parameters = self.compile()?;
        if let Some(predicate) = parameters.get_mut("where") {
            *predicate = JsonValue::String(predicate.to_string());
        }
        Ok(parameters)
    }

    // =========================================================================
    // Compiler hooks
    // =========================================================================

    pub(crate) fn include_key(&mut self, field: &str) {
        self.included_keys.insert(field.to_owned());
    }

    pub(crate) fn select_key(&mut self, field: &str) {
        self.selected_keys.insert(field.to_owned());
    }

    pub(crate) fn set_field(&mut self, key: &str, document: Value) {
        self.constraints.insert(key.to_owned(), document);
    }

    /// Record `field == value` and rebuild `$and` from the whole table.
    pub(crate) fn merge_equality(&mut self, field: &str, value: Value) {
        self.equality_table.insert(field.to_owned(), value);

        let conjuncts = self
            .equality_table
            .iter()
            .map(|(key, value)| Value::Object(IndexMap::from([(key.clone(), value.clone())])))
            .collect();
        self.constraints
            .insert(op::AND.to_owned(), Value::Array(conjuncts));
    }

    pub(crate) fn append_order(&mut self, token: &str) {
        match &mut self.ordered_keys {
            Some(keys) => keys.push_str(token),
            None => self.ordered_keys = Some(token.to_owned()),
        }
    }

    /// `{className, where}` as embedded by `$inQuery` and friends.
    pub(crate) fn subquery_value(&self) -> Value {
        let mut document = Document::new();
        document.insert("className".into(), self.class_name.clone().into());
        document.insert("where".into(), Value::Object(self.constraints.clone()));
        Value::Object(document)
    }
}

fn join_keys(keys: &IndexSet<String>) -> String {
    keys.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}
