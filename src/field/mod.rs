//! Field descriptors: one normalized, UI-bindable attribute or relationship terminus.

mod policy;
mod resolver;

pub use policy::NamingPolicy;
pub use resolver::*;
pub(crate) use resolver::base_field;

use crate::backend::SchemaRef;
use crate::query::QueryOpts;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Semantic data type of a field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    BinaryId,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    NaiveDatetime,
    UtcDatetime,
    Binary,
    Map,
    ManyToOne,
    OneToMany,
    EmbedOne,
    EmbedMany,
    Undefined,
    /// Unrecognized backend-native type, passed through as-is.
    Other(String),
}

impl FieldType {
    pub fn is_association(&self) -> bool {
        matches!(
            self,
            FieldType::ManyToOne | FieldType::OneToMany | FieldType::EmbedOne | FieldType::EmbedMany
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Decimal)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlType {
    Text,
    Number,
    Checkbox,
    Select,
    Textarea,
    Date,
    Time,
    DatetimeLocal,
    Unimplemented,
}

/// Custom rendering callback. Opaque to the core.
#[derive(Clone)]
pub enum Renderer {
    /// `fn(render_context)`
    Unary(Arc<dyn Fn(&Value) -> String + Send + Sync>),
    /// `fn(render_context, entity)`
    Binary(Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>),
}

impl Renderer {
    pub fn render(&self, context: &Value, entity: &Value) -> String {
        match self {
            Renderer::Unary(f) => f(context),
            Renderer::Binary(f) => f(context, entity),
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Unary(_) => f.write_str("Renderer::Unary(..)"),
            Renderer::Binary(_) => f.write_str("Renderer::Binary(..)"),
        }
    }
}

/// How a many-to-one selector labels each related entity.
#[derive(Clone)]
pub enum OptionLabel {
    /// Use the value of this attribute.
    Field(String),
    /// `fn(entity)`
    Unary(Arc<dyn Fn(&Value) -> String + Send + Sync>),
    /// `fn(render_context, entity)`
    Binary(Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>),
}

impl OptionLabel {
    pub fn label_for(&self, context: &Value, entity: &Value) -> String {
        match self {
            OptionLabel::Field(name) => match entity.get(name) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
            OptionLabel::Unary(f) => f(entity),
            OptionLabel::Binary(f) => f(context, entity),
        }
    }
}

impl fmt::Debug for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionLabel::Field(name) => f.debug_tuple("OptionLabel::Field").field(name).finish(),
            OptionLabel::Unary(_) => f.write_str("OptionLabel::Unary(..)"),
            OptionLabel::Binary(_) => f.write_str("OptionLabel::Binary(..)"),
        }
    }
}

impl Serialize for OptionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionLabel::Field(name) => serializer.serialize_str(name),
            OptionLabel::Unary(_) => serializer.serialize_str("fn/1"),
            OptionLabel::Binary(_) => serializer.serialize_str("fn/2"),
        }
    }
}

impl<'de> Deserialize<'de> for OptionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(OptionLabel::Field)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AssociationData {
    /// Registered resource for the related schema; `None` when no resource matches.
    pub resource: Option<String>,
    pub owner_key: String,
    pub related: SchemaRef,
    pub related_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_label: Option<OptionLabel>,
    #[serde(skip_serializing_if = "QueryOpts::is_empty")]
    pub query_opts: QueryOpts,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectData {
    /// `(value, label)` pairs.
    pub opts: Vec<(String, String)>,
    pub multiple: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbedData {
    pub owner: String,
    pub resource: String,
    pub related: SchemaRef,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldData {
    #[default]
    None,
    Association(AssociationData),
    Select(SelectData),
    Embed(EmbedData),
}

#[derive(Clone, Debug, Serialize)]
pub struct Field {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub html_type: HtmlType,
    pub label: String,
    pub placeholder: String,
    pub length: u32,
    pub precision: u32,
    pub scale: u32,
    pub required: bool,
    pub readonly: bool,
    pub disabled: bool,
    pub hidden: bool,
    pub omitted: bool,
    pub filterable: bool,
    #[serde(skip)]
    pub renderer: Option<Renderer>,
    pub data: FieldData,
}

impl Field {
    pub fn association(&self) -> Option<&AssociationData> {
        match &self.data {
            FieldData::Association(a) => Some(a),
            _ => None,
        }
    }

    pub fn embed(&self) -> Option<&EmbedData> {
        match &self.data {
            FieldData::Embed(e) => Some(e),
            _ => None,
        }
    }

    /// Resource the field links to: association target or synthesized embed.
    pub fn related_resource(&self) -> Option<&str> {
        match &self.data {
            FieldData::Association(a) => a.resource.as_deref(),
            FieldData::Embed(e) => Some(e.resource.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_label_dispatch() {
        let entity = json!({"name": "Books", "id": 7});
        let context = json!({"locale": "fr"});

        assert_eq!(OptionLabel::Field("name".into()).label_for(&context, &entity), "Books");
        assert_eq!(OptionLabel::Field("id".into()).label_for(&context, &entity), "7");
        assert_eq!(OptionLabel::Field("missing".into()).label_for(&context, &entity), "");

        let unary = OptionLabel::Unary(Arc::new(|e: &Value| format!("#{}", e["id"])));
        assert_eq!(unary.label_for(&context, &entity), "#7");

        let binary = OptionLabel::Binary(Arc::new(|c: &Value, e: &Value| {
            format!("{}:{}", c["locale"].as_str().unwrap_or_default(), e["name"].as_str().unwrap_or_default())
        }));
        assert_eq!(binary.label_for(&context, &entity), "fr:Books");
    }

    #[test]
    fn renderer_arity() {
        let unary = Renderer::Unary(Arc::new(|_: &Value| "ctx".to_string()));
        let binary = Renderer::Binary(Arc::new(|_: &Value, e: &Value| e["x"].to_string()));
        assert_eq!(unary.render(&json!({}), &json!({"x": 1})), "ctx");
        assert_eq!(binary.render(&json!({}), &json!({"x": 1})), "1");
    }

    #[test]
    fn html_type_serializes_kebab_case() {
        assert_eq!(serde_json::to_value(HtmlType::DatetimeLocal).unwrap(), json!("datetime-local"));
        assert_eq!(serde_json::to_value(FieldType::ManyToOne).unwrap(), json!("many_to_one"));
    }
}
