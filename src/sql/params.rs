//! Bind JSON parameter values to PostgreSQL queries.
//!
//! Every value is sent as TEXT; placeholders carry a `::type` cast where the column type is
//! known, so the server does the conversion.

use super::QueryBuf;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgArguments, PgTypeInfo, Postgres};
use sqlx::query::Query;
use sqlx::Database;

#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Text(String),
}

impl From<&Value> for PgBindValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::String(s) => PgBindValue::Text(s.clone()),
            // Numbers, booleans, arrays and objects in their JSON text form.
            other => PgBindValue::Text(other.to_string()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)?,
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

impl QueryBuf {
    /// The statement with every parameter bound, ready to execute.
    pub fn to_query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query::<Postgres>(&self.sql), |query, param| {
                query.bind(PgBindValue::from(param))
            })
    }
}
