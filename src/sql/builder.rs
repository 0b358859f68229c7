//! Parameterized SELECT for a resource's listing. Identifiers come from resolved fields only;
//! every value is a bind parameter.

use crate::field::{Field, FieldType};
use crate::query::{Filter, FilterOp, OrderBy, OrderTerm, QueryTarget, SortDirection};
use crate::registry::Resource;
use serde_json::Value;

/// Hard cap on LIMIT.
pub const MAX_LIMIT: u32 = 1000;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quoted(schema), quoted(table)),
        None => quoted(table),
    }
}

/// Placeholder cast so text-encoded parameters compare against typed columns.
fn pg_cast(field_type: &FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::Integer => Some("bigint"),
        FieldType::Float => Some("double precision"),
        FieldType::Decimal => Some("numeric"),
        FieldType::Boolean => Some("boolean"),
        FieldType::BinaryId => Some("uuid"),
        FieldType::Date => Some("date"),
        FieldType::Time => Some("time"),
        FieldType::NaiveDatetime => Some("timestamp"),
        FieldType::UtcDatetime => Some("timestamptz"),
        _ => None,
    }
}

/// Whether the field is stored as a column of the resource's own table.
fn is_column(field: &Field) -> bool {
    match &field.field_type {
        FieldType::OneToMany | FieldType::EmbedOne | FieldType::EmbedMany | FieldType::Undefined => false,
        FieldType::ManyToOne => field.association().is_some_and(|a| a.owner_key == field.key),
        _ => true,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub cast: Option<&'static str>,
    /// Selected as `::text` so numeric values come back as strings.
    pub as_text: bool,
}

impl Column {
    fn from_field(field: &Field) -> Self {
        Column {
            name: field.key.clone(),
            cast: pg_cast(&field.field_type),
            as_text: field.field_type == FieldType::Decimal,
        }
    }
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// SELECT over one table. Filters and sort terms on unknown columns are skipped when the
/// column list is known.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<Column>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderTerm>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        SelectQuery {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Columns from the resource's stored, non-omitted fields in field order.
    pub fn from_resource(resource: &Resource, table: &str) -> Self {
        let columns = resource
            .ordered_fields()
            .filter(|f| !f.omitted && is_column(f))
            .map(Column::from_field)
            .collect();
        SelectQuery {
            table: table.to_string(),
            columns,
            ..Default::default()
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn known(&self, name: &str) -> bool {
        self.columns.is_empty() || self.column(name).is_some()
    }

    fn placeholder(&self, q: &mut QueryBuf, column: &str, value: Value) -> String {
        let n = q.push_param(value);
        match self.column(column).and_then(|c| c.cast) {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }

    pub fn build(&self) -> QueryBuf {
        let mut q = QueryBuf::new();
        let cols = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| {
                    if c.as_text {
                        format!("{}::text AS {}", quoted(&c.name), quoted(&c.name))
                    } else {
                        quoted(&c.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut where_parts = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            let col = quoted(&filter.field);
            let part = match filter.op {
                FilterOp::Eq => format!("{} = {}", col, self.placeholder(&mut q, &filter.field, filter.value.clone())),
                FilterOp::Gte => format!("{} >= {}", col, self.placeholder(&mut q, &filter.field, filter.value.clone())),
                FilterOp::Lte => format!("{} <= {}", col, self.placeholder(&mut q, &filter.field, filter.value.clone())),
                FilterOp::In => {
                    let values = filter.value.as_array().cloned().unwrap_or_default();
                    if values.is_empty() {
                        "1 = 0".to_string()
                    } else {
                        let placeholders: Vec<String> = values
                            .into_iter()
                            .map(|v| self.placeholder(&mut q, &filter.field, v))
                            .collect();
                        format!("{} IN ({})", col, placeholders.join(", "))
                    }
                }
            };
            where_parts.push(part);
        }

        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_parts.join(" AND "))
        };
        let order_clause = if self.order.is_empty() {
            String::new()
        } else {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|t| {
                    let dir = match t.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {}", quoted(&t.field), dir)
                })
                .collect();
            format!(" ORDER BY {}", terms.join(", "))
        };
        let limit_clause = self
            .limit
            .map(|n| format!(" LIMIT {}", n.min(MAX_LIMIT)))
            .unwrap_or_default();
        let offset_clause = self.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();

        q.sql = format!(
            "SELECT {} FROM {}{}{}{}{}",
            cols,
            qualified_table(self.schema.as_deref(), &self.table),
            where_clause,
            order_clause,
            limit_clause,
            offset_clause
        );
        q
    }
}

impl QueryTarget for SelectQuery {
    fn filter(mut self, filter: &Filter) -> Self {
        if self.known(&filter.field) {
            self.filters.push(filter.clone());
        } else {
            tracing::warn!(table = %self.table, column = %filter.field, "skipping filter on unknown column");
        }
        self
    }

    fn order_by(mut self, order: &OrderBy) -> Self {
        for term in order.terms() {
            if self.known(&term.field) {
                self.order.push(term);
            } else {
                tracing::warn!(table = %self.table, column = %term.field, "skipping sort on unknown column");
            }
        }
        self
    }
}
