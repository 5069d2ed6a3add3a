//! Request validation errors, reshaped into nested per-field objects.
//!
//! A failure located at `["body", "nested", "dummy"]` with message
//! `"field required"` is reported as `{"nested": {"dummy": "field required"}}`.
//! Failures sharing the same top-level field are merged into one object.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// One validation failure: where it happened and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location path; the first element names the request part (`body`, `query`, ...).
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    pub fn new<I, S>(loc: I, msg: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
        }
    }

    fn path(&self) -> &[String] {
        if self.loc.len() > 1 {
            &self.loc[1..]
        } else {
            &self.loc
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} validation error(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn nested(&self) -> Vec<Value> {
        nest_validation_errors(&self.0)
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": self.nested() })),
        )
            .into_response()
    }
}

/// Fold validation failures into a list of nested objects, one per top-level field.
#[must_use]
pub fn nest_validation_errors(errors: &[FieldError]) -> Vec<Value> {
    let mut nested: Vec<Map<String, Value>> = Vec::new();

    for error in errors {
        let path = error.path();
        let Some(first) = path.first() else {
            continue;
        };

        let index = nested
            .iter()
            .position(|item| item.keys().next() == Some(first))
            .unwrap_or_else(|| {
                nested.push(Map::new());
                nested.len() - 1
            });

        insert_at(&mut nested[index], path, &error.msg);
    }

    nested.into_iter().map(Value::Object).collect()
}

fn insert_at(target: &mut Map<String, Value>, path: &[String], msg: &str) {
    match path {
        [] => {}
        [last] => {
            target.insert(last.clone(), Value::String(msg.to_string()));
        }
        [head, rest @ ..] => {
            let entry = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_at(child, rest, msg);
            }
        }
    }
}
