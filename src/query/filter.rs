//! Structured query for action-based backends: accumulates filters and sort terms and can
//! evaluate them over JSON records.

use crate::query::{Filter, FilterOp, OrderBy, OrderTerm, QueryTarget, SortDirection};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<OrderTerm>,
}

impl QueryTarget for FilterQuery {
    fn filter(mut self, filter: &Filter) -> Self {
        self.filters.push(filter.clone());
        self
    }

    fn order_by(mut self, order: &OrderBy) -> Self {
        self.sort.extend(order.terms());
        self
    }
}

impl FilterQuery {
    /// Whether a record satisfies every filter (missing fields compare as null).
    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|f| {
            let actual = record.get(&f.field).unwrap_or(&Value::Null);
            match f.op {
                FilterOp::Eq => compare(actual, &f.value) == Some(Ordering::Equal),
                FilterOp::Gte => matches!(compare(actual, &f.value), Some(Ordering::Greater | Ordering::Equal)),
                FilterOp::Lte => matches!(compare(actual, &f.value), Some(Ordering::Less | Ordering::Equal)),
                FilterOp::In => f
                    .value
                    .as_array()
                    .map(|items| items.iter().any(|v| compare(actual, v) == Some(Ordering::Equal)))
                    .unwrap_or(false),
            }
        })
    }

    /// Filter then sort `records`.
    pub fn apply(&self, records: &[Value]) -> Vec<Value> {
        let mut out: Vec<Value> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        out.sort_by(|a, b| {
            for term in &self.sort {
                let left = a.get(&term.field).unwrap_or(&Value::Null);
                let right = b.get(&term.field).unwrap_or(&Value::Null);
                let ord = compare(left, right).unwrap_or(Ordering::Equal);
                let ord = match term.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        out
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64()?.partial_cmp(&m.as_f64()?),
        (Value::String(s), Value::String(t)) => Some(s.cmp(t)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{translate, QueryOpts};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"reference": "a", "price": 5, "status": "draft"}),
            json!({"reference": "b", "price": 15, "status": "active"}),
            json!({"reference": "c", "price": 20, "status": "active"}),
            json!({"reference": "d", "price": 25, "status": "archived"}),
        ]
    }

    fn references(rows: &[Value]) -> Vec<&str> {
        rows.iter().filter_map(|r| r["reference"].as_str()).collect()
    }

    #[test]
    fn between_is_inclusive() {
        let opts: QueryOpts = serde_json::from_value(json!({"where": [["price", "between", 10, 20]]})).unwrap();
        let query = translate(FilterQuery::default(), &opts);
        assert_eq!(references(&query.apply(&records())), vec!["b", "c"]);
    }

    #[test]
    fn in_matches_any_listed_value() {
        let opts: QueryOpts =
            serde_json::from_value(json!({"where": [["status", "in", "draft,archived"]], "order_by": [{"price": "desc"}]}))
                .unwrap();
        let query = translate(FilterQuery::default(), &opts);
        assert_eq!(references(&query.apply(&records())), vec!["d", "a"]);
    }

    #[test]
    fn mismatched_types_never_match() {
        let query = FilterQuery::default().filter(&Filter::new("price", FilterOp::Eq, json!("15")));
        assert!(query.apply(&records()).is_empty());
    }
}
