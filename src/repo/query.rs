use rusqlite::types::Value;
use std::fmt;

use super::Entity;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A WHERE-clause expression over one entity's columns.
///
/// Column names are checked against the entity before they reach SQL; values
/// are always bound as parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    Like {
        column: String,
        pattern: String,
    },
    IsNull(String),
    In {
        column: String,
        values: Vec<Value>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Ne, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Ge, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::compare(column, CompareOp::Le, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull(column.into())
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut parts) => {
                parts.push(other);
                Filter::Or(parts)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Render this filter as SQL for `E`, appending bound values to `params`.
    pub(crate) fn to_sql<E: Entity>(&self, params: &mut Vec<Value>) -> Result<String> {
        let sql = match self {
            Filter::Compare { column, op, value } => {
                let column = checked_column::<E>(column)?;
                params.push(value.clone());
                format!("{column} {} ?", op.as_sql())
            }
            Filter::Like { column, pattern } => {
                let column = checked_column::<E>(column)?;
                params.push(Value::Text(pattern.clone()));
                format!("{column} LIKE ?")
            }
            Filter::IsNull(column) => {
                format!("{} IS NULL", checked_column::<E>(column)?)
            }
            Filter::In { column, values } => {
                let column = checked_column::<E>(column)?;
                if values.is_empty() {
                    // Nothing can match an empty set.
                    return Ok("1 = 0".to_string());
                }
                if values.len() > INLINE_IN_LIMIT {
                    params.push(Value::Text(json_array(values)?));
                    format!("{column} IN (SELECT value FROM json_each(?))")
                } else {
                    params.extend(values.iter().cloned());
                    format!("{column} IN ({})", placeholders(values.len()))
                }
            }
            Filter::And(parts) => join::<E>(parts, " AND ", "1 = 1", params)?,
            Filter::Or(parts) => join::<E>(parts, " OR ", "1 = 0", params)?,
            Filter::Not(inner) => format!("NOT ({})", inner.to_sql::<E>(params)?),
        };
        Ok(sql)
    }
}

fn join<E: Entity>(
    parts: &[Filter],
    separator: &str,
    empty: &str,
    params: &mut Vec<Value>,
) -> Result<String> {
    if parts.is_empty() {
        return Ok(empty.to_string());
    }
    let rendered = parts
        .iter()
        .map(|p| p.to_sql::<E>(params).map(|sql| format!("({sql})")))
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join(separator))
}

/// Longer `IN` lists travel as one JSON array parameter; SQLite caps bound
/// variables at 32766 per statement.
const INLINE_IN_LIMIT: usize = 500;

fn json_array(values: &[Value]) -> Result<String> {
    let items = values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Integer(i) => Ok(serde_json::Value::from(*i)),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| Error::Validation(format!("cannot match non-finite number {f}"))),
            Value::Text(t) => Ok(serde_json::Value::from(t.as_str())),
            Value::Blob(_) => Err(Error::Validation(
                "blob values cannot be matched in a long IN list".to_string(),
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string(&items)?)
}

/// `?, ?, ?` for `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Resolve `column` to a known column of `E`, or fail.
pub(crate) fn checked_column<E: Entity>(column: &str) -> Result<&'static str> {
    if column == "id" {
        return Ok("id");
    }
    E::COLUMNS
        .iter()
        .copied()
        .find(|c| *c == column)
        .ok_or_else(|| Error::UnknownColumn {
            table: E::TABLE,
            column: column.to_string(),
        })
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            descending: true,
        }
    }

    /// Parse `"year"` / `"-year"` style sort keys.
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix('-') {
            Some(column) => Order::desc(column),
            None => Order::asc(key.strip_prefix('+').unwrap_or(key)),
        }
    }

    pub(crate) fn to_sql<E: Entity>(&self) -> Result<String> {
        let column = checked_column::<E>(&self.column)?;
        let direction = if self.descending { "DESC" } else { "ASC" };
        Ok(format!("{column} {direction}"))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.column)
        } else {
            write!(f, "{}", self.column)
        }
    }
}

/// Filter, ordering, and navigations to include for a repository read.
pub struct Query<E: Entity> {
    pub filter: Option<Filter>,
    pub order: Vec<Order>,
    pub include: Vec<E::Navigation>,
}

impl<E: Entity> Default for Query<E> {
    fn default() -> Self {
        Query {
            filter: None,
            order: Vec::new(),
            include: Vec::new(),
        }
    }
}

impl<E: Entity> Clone for Query<E> {
    fn clone(&self) -> Self {
        Query {
            filter: self.filter.clone(),
            order: self.order.clone(),
            include: self.include.clone(),
        }
    }
}

impl<E: Entity> Query<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; a second call is AND-ed with the first.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn include(mut self, navigation: E::Navigation) -> Self {
        self.include.push(navigation);
        self
    }
}
