//! Backend-neutral metadata shapes returned by every adapter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque handle to a backend schema / resource module. Never interpreted beyond equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRef(pub String);

/// Opaque handle to a context (simple backend) or domain (declarative backend).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextRef(pub String);

impl SchemaRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContextRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaRef {
    fn from(s: &str) -> Self {
        SchemaRef(s.to_string())
    }
}

impl From<&str> for ContextRef {
    fn from(s: &str) -> Self {
        ContextRef(s.to_string())
    }
}

/// One plain attribute of a backend schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    pub name: String,
    /// Backend-native type name (e.g. "string", "decimal", "utc_datetime").
    #[serde(rename = "type")]
    pub native_type: String,
    /// Enumerated constraint: allowed values for string-like attributes.
    #[serde(default)]
    pub one_of: Option<Vec<String>>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_true")]
    pub allow_nil: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

fn default_true() -> bool {
    true
}

impl AttributeMeta {
    pub fn new(name: &str, native_type: &str) -> Self {
        AttributeMeta {
            name: name.to_string(),
            native_type: native_type.to_string(),
            one_of: None,
            primary_key: false,
            allow_nil: true,
            default: None,
        }
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_nil = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.allow_nil = false;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    #[serde(alias = "belongs_to")]
    ManyToOne,
    #[serde(alias = "has_many")]
    OneToMany,
    #[serde(alias = "embeds_one")]
    EmbedOne,
    #[serde(alias = "embeds_many")]
    EmbedMany,
}

impl RelationshipKind {
    pub fn is_embed(self) -> bool {
        matches!(self, RelationshipKind::EmbedOne | RelationshipKind::EmbedMany)
    }
}

/// A relationship from one schema to another (or to an embedded schema).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMeta {
    pub name: String,
    pub kind: RelationshipKind,
    pub destination: SchemaRef,
    /// Key on the owning side: foreign key for many_to_one, local key for one_to_many.
    #[serde(default)]
    pub source_attribute: Option<String>,
    /// Key on the destination side: primary key for many_to_one, foreign key for one_to_many.
    #[serde(default)]
    pub destination_attribute: Option<String>,
}

impl RelationshipMeta {
    pub fn new(name: &str, kind: RelationshipKind, destination: &str) -> Self {
        RelationshipMeta {
            name: name.to_string(),
            kind,
            destination: SchemaRef::from(destination),
            source_attribute: None,
            destination_attribute: None,
        }
    }

    pub fn keys(mut self, source: &str, destination: &str) -> Self {
        self.source_attribute = Some(source.to_string());
        self.destination_attribute = Some(destination.to_string());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Read,
    Create,
    Update,
    Destroy,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Read => "read",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Destroy => "destroy",
        }
    }
}

/// Pagination support declared by an action: a flag or an options map (options imply support).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pagination {
    Enabled(bool),
    Options(Map<String, Value>),
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Enabled(false)
    }
}

impl Pagination {
    pub fn is_enabled(&self) -> bool {
        match self {
            Pagination::Enabled(b) => *b,
            Pagination::Options(_) => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub pagination: Pagination,
    /// Function arity, when the backend exposes plain functions.
    #[serde(default)]
    pub arity: Option<u8>,
}

impl ActionMeta {
    pub fn new(name: &str, kind: ActionKind) -> Self {
        ActionMeta {
            name: name.to_string(),
            kind,
            primary: false,
            pagination: Pagination::default(),
            arity: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn paginated(mut self) -> Self {
        self.pagination = Pagination::Enabled(true);
        self
    }
}

/// What a context/domain-exposed name points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTarget {
    /// Schema the action operates on; `None` when the backend cannot tell.
    pub schema: Option<SchemaRef>,
    pub action: String,
    pub arity: Option<u8>,
}
