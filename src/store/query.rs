use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value as JsonValue;

/// Default page size, also the cap used when loading a whole collection.
pub const DEFAULT_LIMIT: usize = 1000;

/// Filter expression over the fields of a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field equals the value.
    Eq(String, JsonValue),
    /// Text field contains the fragment.
    Contains(String, String),
    /// Any of the expressions holds.
    Or(Vec<Expr>),
}

impl Expr {
    pub fn eq(
        key: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        Expr::Eq(key.into(), value.into())
    }

    pub fn contains(
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Expr::Contains(key.into(), text.into())
    }

    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Keyword search over several text fields.
    pub fn search(
        keys: &[&str],
        text: &str,
    ) -> Self {
        Expr::Or(keys.iter().map(|k| Expr::contains(*k, text)).collect())
    }

    pub fn is_match(
        &self,
        doc: &HashMap<String, JsonValue>,
    ) -> bool {
        match self {
            Expr::Eq(key, value) => doc.get(key).is_some_and(|v| v == value),
            Expr::Contains(key, text) => match doc.get(key) {
                Some(JsonValue::String(s)) => s.contains(text.as_str()),
                Some(JsonValue::Null) | None => false,
                Some(other) => other.to_string().contains(text.as_str()),
            },
            Expr::Or(exprs) => exprs.iter().any(|e| e.is_match(doc)),
        }
    }
}

/// Paged query: filters are AND-combined.
#[derive(Debug, Clone)]
pub struct Query {
    filters: Vec<Expr>,
    order_by: Vec<(String, bool)>,
    limit: usize,
    offset: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn filter(
        mut self,
        expr: Expr,
    ) -> Self {
        self.filters.push(expr);
        self
    }

    /// Adds an ordering key, descending when `rev` is set.
    pub fn set_order(
        mut self,
        key: &str,
        rev: bool,
    ) -> Self {
        self.order_by.push((key.to_string(), rev));
        self
    }

    pub fn set_limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn set_offset(
        mut self,
        offset: usize,
    ) -> Self {
        self.offset = offset;
        self
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    pub fn order_by(&self) -> &[(String, bool)] {
        &self.order_by
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_match(
        &self,
        doc: &HashMap<String, JsonValue>,
    ) -> bool {
        self.filters.iter().all(|f| f.is_match(doc))
    }

    /// Compares two documents by the ordering keys.
    pub fn compare(
        &self,
        a: &HashMap<String, JsonValue>,
        b: &HashMap<String, JsonValue>,
    ) -> Ordering {
        for (key, rev) in &self.order_by {
            let ord = cmp_json(a.get(key), b.get(key));
            let ord = if *rev {
                ord.reverse()
            } else {
                ord
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn cmp_json(
    a: Option<&JsonValue>,
    b: Option<&JsonValue>,
) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            x.as_f64().unwrap_or_default().partial_cmp(&y.as_f64().unwrap_or_default()).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
