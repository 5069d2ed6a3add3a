//! Translation of identifiers into SQL statements.
//!
//! Values are always bound as parameters except `NULL`, which is written
//! literally. Table and column names are checked against the registered
//! [`SyncModel`] and quoted.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
use crate::protocol::{FilterOp, Identifier};

/// Placeholder style of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?`
    Sqlite,
    /// `$1`, `$2`, ...
    Postgres,
}

impl Dialect {
    fn placeholder(self, position: usize) -> String {
        match self {
            Self::Sqlite => "?".to_string(),
            Self::Postgres => format!("${position}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Arrays and objects are bound as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// A table whose rows may be changed by sync requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncModel {
    table: String,
    /// Column name to optional SQL type bound values are cast to.
    columns: BTreeMap<String, Option<String>>,
}

impl SyncModel {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(|c| (c.into(), None)).collect(),
        }
    }

    /// Register `column` with values cast to `sql_type`, e.g. `timestamptz`.
    #[must_use]
    pub fn with_cast(mut self, column: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.insert(column.into(), Some(sql_type.into()));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn column(&self, name: &str) -> Result<Column> {
        let cast = self
            .columns
            .get(name)
            .ok_or_else(|| SyncError::UnknownColumn {
                table: self.table.clone(),
                column: name.to_string(),
            })?;
        Ok(Column {
            name: name.to_string(),
            cast: cast.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub cast: Option<String>,
}

/// One condition of a `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: Column,
        op: &'static str,
        value: SqlValue,
    },
    /// `IS [NOT] NULL|TRUE|FALSE`; `None` is `NULL`.
    Is {
        column: Column,
        negated: bool,
        value: Option<bool>,
    },
    In {
        column: Column,
        negated: bool,
        values: Vec<SqlValue>,
    },
}

/// Build the conditions selecting the rows matched by `identifiers`.
///
/// # Errors
///
/// Fails on a column the model does not register, or a value the operator
/// cannot take.
pub fn format_sql_filter(model: &SyncModel, identifiers: &[Identifier]) -> Result<Vec<Predicate>> {
    identifiers
        .iter()
        .map(|Identifier(name, op, value)| {
            let column = model.column(name)?;
            let invalid = |reason: &str| SyncError::InvalidFilter {
                column: name.clone(),
                reason: reason.to_string(),
            };

            let predicate = match op {
                FilterOp::Eq | FilterOp::Ne if value.is_null() => Predicate::Is {
                    column,
                    negated: *op == FilterOp::Ne,
                    value: None,
                },
                FilterOp::Eq => compare(column, "=", value),
                FilterOp::Ne => compare(column, "<>", value),
                FilterOp::Ge => compare(column, ">=", value),
                FilterOp::Gt => compare(column, ">", value),
                FilterOp::Lt => compare(column, "<", value),
                FilterOp::Le => compare(column, "<=", value),
                FilterOp::In | FilterOp::NotIn => {
                    let items = value
                        .as_array()
                        .ok_or_else(|| invalid("expected a list of values"))?;
                    Predicate::In {
                        column,
                        negated: *op == FilterOp::NotIn,
                        values: items.iter().map(SqlValue::from_json).collect(),
                    }
                }
                FilterOp::Is | FilterOp::IsNot => {
                    let value = match value {
                        Value::Null => None,
                        Value::Bool(b) => Some(*b),
                        _ => return Err(invalid("expected null or a boolean")),
                    };
                    Predicate::Is {
                        column,
                        negated: *op == FilterOp::IsNot,
                        value,
                    }
                }
            };
            Ok(predicate)
        })
        .collect()
}

fn compare(column: Column, op: &'static str, value: &Value) -> Predicate {
    Predicate::Compare {
        column,
        op,
        value: SqlValue::from_json(value),
    }
}

/// `DELETE FROM <table> WHERE ...`
pub fn delete_statement(model: &SyncModel, predicates: &[Predicate], dialect: Dialect) -> Statement {
    let mut builder = StatementBuilder::new(dialect);
    builder.push("DELETE FROM ");
    builder.push(&quote(&model.table));
    builder.push_where(predicates);
    builder.finish()
}

/// `UPDATE <table> SET c = ?, ... WHERE ...`
///
/// # Errors
///
/// Fails when `columns` is empty or names a column the model does not register.
pub fn update_statement(
    model: &SyncModel,
    columns: &Map<String, Value>,
    predicates: &[Predicate],
    dialect: Dialect,
) -> Result<Statement> {
    if columns.is_empty() {
        return Err(SyncError::MissingColumns(model.table.clone()));
    }

    let mut builder = StatementBuilder::new(dialect);
    builder.push("UPDATE ");
    builder.push(&quote(&model.table));
    builder.push(" SET ");
    for (i, (name, value)) in columns.iter().enumerate() {
        let column = model.column(name)?;
        if i > 0 {
            builder.push(", ");
        }
        builder.push(&quote(&column.name));
        builder.push(" = ");
        builder.push_value(SqlValue::from_json(value), column.cast.as_deref());
    }
    builder.push_where(predicates);
    Ok(builder.finish())
}

struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl StatementBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_value(&mut self, value: SqlValue, cast: Option<&str>) {
        if value == SqlValue::Null {
            self.push("NULL");
            return;
        }
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        match cast {
            Some(sql_type) => self.sql.push_str(&format!("CAST({placeholder} AS {sql_type})")),
            None => self.sql.push_str(&placeholder),
        }
    }

    fn push_where(&mut self, predicates: &[Predicate]) {
        for (i, predicate) in predicates.iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.push_predicate(predicate);
        }
    }

    fn push_predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { column, op, value } => {
                self.push(&quote(&column.name));
                self.push(&format!(" {op} "));
                self.push_value(value.clone(), column.cast.as_deref());
            }
            Predicate::Is {
                column,
                negated,
                value,
            } => {
                self.push(&quote(&column.name));
                self.push(if *negated { " IS NOT " } else { " IS " });
                self.push(match value {
                    None => "NULL",
                    Some(true) => "TRUE",
                    Some(false) => "FALSE",
                });
            }
            Predicate::In { negated, values, .. } if values.is_empty() => {
                self.push(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::In {
                column,
                negated,
                values,
            } => {
                self.push(&quote(&column.name));
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push_value(value.clone(), column.cast.as_deref());
                }
                self.push(")");
            }
        }
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
