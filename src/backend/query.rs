use std::cmp::Ordering;

use serde_json::Value;

use crate::backend::Record;

/// Conjunction of conditions with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Vec<Condition>,
    order: Option<Order>,
    limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Neq(String, Value),
    Gt(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn neq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Neq(column.into(), value.into()));
        self
    }

    pub fn gt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Gt(column.into(), value.into()));
        self
    }

    pub fn lt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Lt(column.into(), value.into()));
        self
    }

    pub fn any_of<V>(mut self, column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        self.conditions.push(Condition::In(
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Value of the first equality condition on `column`.
    pub fn eq_value(&self, column: &str) -> Option<&Value> {
        self.conditions.iter().find_map(|condition| match condition {
            Condition::Eq(c, v) if c == column => Some(v),
            _ => None,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(record))
    }

    /// Apply conditions, order and limit to the records.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
        let mut matched: Vec<Record> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();

        if let Some(order) = &self.order {
            matched.sort_by(|a, b| {
                let ordering = compare(field(a, &order.column), field(b, &order.column))
                    .unwrap_or(Ordering::Equal);
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }

    /// Render as query string pairs in the PostgREST filter syntax.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq(c, v) => (c.clone(), format!("eq.{}", literal(v))),
                Condition::Neq(c, v) => (c.clone(), format!("neq.{}", literal(v))),
                Condition::Gt(c, v) => (c.clone(), format!("gt.{}", literal(v))),
                Condition::Lt(c, v) => (c.clone(), format!("lt.{}", literal(v))),
                Condition::In(c, vs) => {
                    let list = vs.iter().map(quoted).collect::<Vec<_>>().join(",");
                    (c.clone(), format!("in.({})", list))
                }
            })
            .collect();

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".into(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".into(), limit.to_string()));
        }
        params
    }
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(c, v) => field(record, c) == Some(v),
            Condition::Neq(c, v) => field(record, c) != Some(v),
            Condition::Gt(c, v) => compare(field(record, c), Some(v)) == Some(Ordering::Greater),
            Condition::Lt(c, v) => compare(field(record, c), Some(v)) == Some(Ordering::Less),
            Condition::In(c, vs) => field(record, c).map_or(false, |got| vs.contains(got)),
        }
    }
}

fn field<'a>(record: &'a Record, column: &str) -> Option<&'a Value> {
    record.get(column).filter(|v| !v.is_null())
}

// Numbers compare numerically, strings lexically. Timestamps are stored as rfc3339 strings.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (a?, b?) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => other.to_string(),
    }
}
