//! Wire types of sync requests.
//!
//! A request maps table names to the row operations to apply on them:
//!
//! ```json
//! {
//!   "nrlink_power_metrics": [
//!     {"identifiers": [["meter_guid", "==", "abc"]], "op": "UPDATE",
//!      "columns_to_sync": {"created_at": "2024-01-01T00:00:00Z"}}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

/// Table name to row operations. Tables are processed in name order.
pub type SyncRequest = BTreeMap<String, Vec<RowToSync>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowToSync {
    pub identifiers: Vec<Identifier>,
    pub op: SyncOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns_to_sync: Option<Map<String, Value>>,
}

impl RowToSync {
    pub fn delete(identifiers: Vec<Identifier>) -> Self {
        Self {
            identifiers,
            op: SyncOp::Delete,
            columns_to_sync: None,
        }
    }

    pub fn update(identifiers: Vec<Identifier>, columns_to_sync: Map<String, Value>) -> Self {
        Self {
            identifiers,
            op: SyncOp::Update,
            columns_to_sync: Some(columns_to_sync),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncOp {
    Delete,
    Update,
}

/// `[column, operator, value]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier(pub String, pub FilterOp, pub Value);

impl Identifier {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self(column.into(), op, value.into())
    }

    pub fn column(&self) -> &str {
        &self.0
    }

    pub fn op(&self) -> FilterOp {
        self.1
    }

    pub fn value(&self) -> &Value {
        &self.2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FilterOp {
    Eq,
    Ne,
    In,
    NotIn,
    Is,
    IsNot,
    Ge,
    Gt,
    Lt,
    Le,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::In => "in_",
            Self::NotIn => "notin_",
            Self::Is => "is_",
            Self::IsNot => "not_",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "in_" => Self::In,
            "notin_" => Self::NotIn,
            "is_" => Self::Is,
            "not_" => Self::IsNot,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            "<" => Self::Lt,
            "<=" => Self::Le,
            other => return Err(SyncError::UnknownOperator(other.to_string())),
        })
    }
}

impl TryFrom<String> for FilterOp {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterOp> for &'static str {
    fn from(op: FilterOp) -> Self {
        op.as_str()
    }
}
