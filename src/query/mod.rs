//! Query option translator: the `order_by` / `where` DSL and its application to backend queries.
//!
//! Options arrive as free-form JSON maps (resource opts, layout opts, URL filters). Unknown keys
//! are ignored. Clauses are normalized into [`Filter`]s before reaching a [`QueryTarget`].

mod coerce;
mod filter;

pub use coerce::*;
pub use filter::FilterQuery;

use crate::registry::Resource;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: SortDirection,
}

/// Written back as a `[field, direction]` pair.
impl Serialize for OrderTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.field, self.direction).serialize(serializer)
    }
}

/// Sort declaration, kept in the shape it was declared in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderBy {
    /// `"name"`
    Field(String),
    /// `["name", {"price": "desc"}, ["id", "asc"]]`
    List(Vec<OrderTerm>),
}

impl OrderBy {
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(OrderBy::Field(s.clone())),
            Value::Object(obj) => Some(OrderBy::List(object_terms(obj))),
            Value::Array(items) => {
                let mut terms = Vec::new();
                for item in items {
                    match item {
                        Value::String(s) => terms.push(OrderTerm {
                            field: s.clone(),
                            direction: SortDirection::Asc,
                        }),
                        Value::Object(obj) => terms.extend(object_terms(obj)),
                        Value::Array(pair) => match pair.as_slice() {
                            [Value::String(field), Value::String(dir)] => {
                                if let Some(direction) = SortDirection::parse(dir) {
                                    terms.push(OrderTerm {
                                        field: field.clone(),
                                        direction,
                                    });
                                }
                            }
                            _ => tracing::warn!(term = %item, "ignoring malformed order_by term"),
                        },
                        _ => tracing::warn!(term = %item, "ignoring malformed order_by term"),
                    }
                }
                Some(OrderBy::List(terms))
            }
            _ => None,
        }
    }

    /// The declaration as a flat list of terms.
    pub fn terms(&self) -> Vec<OrderTerm> {
        match self {
            OrderBy::Field(f) => vec![OrderTerm {
                field: f.clone(),
                direction: SortDirection::Asc,
            }],
            OrderBy::List(terms) => terms.clone(),
        }
    }
}

// Object keys come back in serde_json's map order; multi-key sorts belong in a list.
fn object_terms(obj: &Map<String, Value>) -> Vec<OrderTerm> {
    obj.iter()
        .filter_map(|(field, dir)| {
            let direction = dir.as_str().and_then(SortDirection::parse)?;
            Some(OrderTerm {
                field: field.clone(),
                direction,
            })
        })
        .collect()
}

/// One `where` clause as declared.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereClause {
    /// `[field, value]`: implicit equality.
    Equals(String, Value),
    /// `[field, op, value]`
    Compare(String, String, Value),
    /// `[field, "between", low, high]`
    Between(String, Value, Value),
}

impl WhereClause {
    pub fn parse(value: &Value) -> Option<Self> {
        let Value::Array(items) = value else {
            return None;
        };
        match items.as_slice() {
            [Value::String(field), value] => Some(WhereClause::Equals(field.clone(), value.clone())),
            [Value::String(field), Value::String(op), value] => {
                Some(WhereClause::Compare(field.clone(), op.clone(), value.clone()))
            }
            [Value::String(field), Value::String(op), low, high] if op == "between" => {
                Some(WhereClause::Between(field.clone(), low.clone(), high.clone()))
            }
            _ => None,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            WhereClause::Equals(f, _) | WhereClause::Compare(f, _, _) | WhereClause::Between(f, _, _) => f,
        }
    }
}

impl Serialize for WhereClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WhereClause::Equals(field, value) => (field, value).serialize(serializer),
            WhereClause::Compare(field, op, value) => (field, op, value).serialize(serializer),
            WhereClause::Between(field, low, high) => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(field)?;
                seq.serialize_element("between")?;
                seq.serialize_element(low)?;
                seq.serialize_element(high)?;
                seq.end()
            }
        }
    }
}

/// Normalized comparison operator handed to backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    In,
}

impl FilterOp {
    /// Operator aliases. `like` / `ilike` collapse to plain equality: textual matching is not
    /// implemented, so a `like` filter only matches the exact value.
    pub fn normalize(op: &str) -> Option<Self> {
        match op {
            "eq" | "equal_to" | "like" | "ilike" => Some(FilterOp::Eq),
            "gte" | "ge" | "greater_equal_than" => Some(FilterOp::Gte),
            "lte" | "le" | "less_equal_than" => Some(FilterOp::Lte),
            "in" => Some(FilterOp::In),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    /// For `In`, always an array.
    pub value: Value,
}

impl Filter {
    pub fn new(field: &str, op: FilterOp, value: Value) -> Self {
        let value = match op {
            FilterOp::In => in_values(value),
            _ => value,
        };
        Filter {
            field: field.to_string(),
            op,
            value,
        }
    }
}

/// `in` accepts a list or a comma-separated string.
fn in_values(value: Value) -> Value {
    match value {
        Value::String(s) => Value::Array(s.split(',').map(|v| Value::String(v.to_string())).collect()),
        Value::Array(items) => Value::Array(items),
        other => Value::Array(vec![other]),
    }
}

/// Parsed query options.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_: Vec<WhereClause>,
}

impl QueryOpts {
    /// Read `order_by` (or `orderBy`) and `where` from an options map; other keys are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let order_by = map
            .get("order_by")
            .or_else(|| map.get("orderBy"))
            .and_then(OrderBy::parse);
        let where_ = match map.get("where") {
            Some(Value::Array(clauses)) => clauses
                .iter()
                .filter_map(|c| {
                    let parsed = WhereClause::parse(c);
                    if parsed.is_none() {
                        tracing::warn!(clause = %c, "ignoring malformed where clause");
                    }
                    parsed
                })
                .collect(),
            _ => Vec::new(),
        };
        QueryOpts { order_by, where_ }
    }

    pub fn is_empty(&self) -> bool {
        self.order_by.is_none() && self.where_.is_empty()
    }

    /// Normalize clauses: aliases resolved, `between` expanded, `in` strings split.
    /// Clauses with an unknown operator are dropped.
    pub fn filters(&self) -> Vec<Filter> {
        let mut out = Vec::with_capacity(self.where_.len());
        for clause in &self.where_ {
            match clause {
                WhereClause::Equals(field, value) => out.push(Filter::new(field, FilterOp::Eq, value.clone())),
                WhereClause::Compare(field, op, value) => match FilterOp::normalize(op) {
                    Some(op) => out.push(Filter::new(field, op, value.clone())),
                    None => tracing::warn!(field = %field, op = %op, "dropping where clause with unknown operator"),
                },
                WhereClause::Between(field, low, high) => {
                    out.push(Filter::new(field, FilterOp::Gte, low.clone()));
                    out.push(Filter::new(field, FilterOp::Lte, high.clone()));
                }
            }
        }
        out
    }
}

impl<'de> Deserialize<'de> for QueryOpts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(QueryOpts::from_map(&map))
    }
}

/// A backend query the options can be applied to.
pub trait QueryTarget: Sized {
    fn filter(self, filter: &Filter) -> Self;
    fn order_by(self, order: &OrderBy) -> Self;
}

/// Apply options to `base`. Pure: returns the extended query.
pub fn translate<Q: QueryTarget>(base: Q, opts: &QueryOpts) -> Q {
    let mut query = base;
    for filter in opts.filters() {
        query = query.filter(&filter);
    }
    if let Some(order) = &opts.order_by {
        query = query.order_by(order);
    }
    query
}

/// Apply options against a resource: string values are coerced to the field's type and
/// filters on unknown or non-filterable fields are dropped.
pub fn translate_for<Q: QueryTarget>(resource: &Resource, base: Q, opts: &QueryOpts) -> Q {
    let mut query = base;
    for filter in opts.filters() {
        let Some(field) = resource.field(&filter.field) else {
            tracing::warn!(resource = %resource.name, field = %filter.field, "dropping filter on unknown field");
            continue;
        };
        if !field.filterable || field.omitted {
            tracing::warn!(resource = %resource.name, field = %filter.field, "dropping filter on non-filterable field");
            continue;
        }
        query = query.filter(&coerce_filter(field, filter));
    }
    if let Some(order) = &opts.order_by {
        query = query.order_by(order);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn opts(v: Value) -> QueryOpts {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn between_equals_gte_and_lte() {
        let between = translate(FilterQuery::default(), &opts(json!({"where": [["price", "between", 10, 20]]})));
        let explicit = translate(
            FilterQuery::default(),
            &opts(json!({"where": [["price", "gte", 10], ["price", "lte", 20]]})),
        );
        assert_eq!(between, explicit);
    }

    #[test]
    fn in_accepts_list_or_comma_string() {
        let from_string = translate(FilterQuery::default(), &opts(json!({"where": [["status", "in", "a,b,c"]]})));
        let from_list = translate(
            FilterQuery::default(),
            &opts(json!({"where": [["status", "in", ["a", "b", "c"]]]})),
        );
        assert_eq!(from_string, from_list);
    }

    #[test]
    fn operator_aliases_normalize() {
        let q = opts(json!({"where": [
            ["a", "ge", 1], ["b", "greater_equal_than", 1],
            ["c", "le", 1], ["d", "less_equal_than", 1],
            ["e", "equal_to", 1], ["f", 1]
        ]}));
        let ops: Vec<_> = q.filters().into_iter().map(|f| f.op).collect();
        assert_eq!(
            ops,
            vec![FilterOp::Gte, FilterOp::Gte, FilterOp::Lte, FilterOp::Lte, FilterOp::Eq, FilterOp::Eq]
        );
    }

    // like/ilike are equality, not substring matching.
    #[test]
    fn like_is_plain_equality() {
        let q = opts(json!({"where": [["name", "like", "%wid%"], ["name", "ilike", "Widget"]]}));
        let filters = q.filters();
        assert_eq!(filters[0], Filter::new("name", FilterOp::Eq, json!("%wid%")));
        assert_eq!(filters[1], Filter::new("name", FilterOp::Eq, json!("Widget")));
    }

    #[test]
    fn unknown_keys_and_operators_are_ignored() {
        let q = opts(json!({"limit": 5, "preload": ["x"], "where": [["a", "regex", "x"], ["b", 2]]}));
        assert_eq!(q.order_by, None);
        assert_eq!(q.filters(), vec![Filter::new("b", FilterOp::Eq, json!(2))]);
    }

    #[test]
    fn serialized_opts_read_back_unchanged() {
        let original = opts(json!({
            "order_by": ["name", {"price": "desc"}],
            "where": [["price", "between", 10, 20], ["status", "in", "a,b"], ["name", "x"]]
        }));
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(
            value,
            json!({
                "order_by": [["name", "asc"], ["price", "desc"]],
                "where": [["price", "between", 10, 20], ["status", "in", "a,b"], ["name", "x"]]
            })
        );
        let reread = opts(value);
        assert_eq!(reread, original);
        assert_eq!(reread.filters(), original.filters());
    }

    #[test]
    fn order_by_shapes_pass_through() {
        assert_eq!(opts(json!({"order_by": "name"})).order_by, Some(OrderBy::Field("name".into())));
        let list = opts(json!({"orderBy": ["name", {"price": "desc"}, ["id", "asc"]]}));
        assert_eq!(
            list.order_by.unwrap().terms(),
            vec![
                OrderTerm { field: "name".into(), direction: SortDirection::Asc },
                OrderTerm { field: "price".into(), direction: SortDirection::Desc },
                OrderTerm { field: "id".into(), direction: SortDirection::Asc },
            ]
        );
    }
}
