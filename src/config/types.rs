//! Raw declarative metadata: what a declaring module says about its resources.

use crate::backend::{BackendKind, ContextRef, SchemaRef};
use crate::config::LayoutConfig;
use crate::error::ConfigError;
use crate::field::{FieldType, HtmlType, OptionLabel, Renderer};
use crate::operation::InitializerFn;
use crate::query::QueryOpts;
use crate::routes::RoutesConfig;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Fixed option of a select field: `"S"` or `["L", "Large"]`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Value(String),
    Labeled(String, String),
}

impl SelectOption {
    pub fn pair(&self) -> (String, String) {
        match self {
            SelectOption::Value(v) => (v.clone(), v.clone()),
            SelectOption::Labeled(v, l) => (v.clone(), l.clone()),
        }
    }
}

/// User customization of one field. Every `None` keeps the derived default.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub html_type: Option<HtmlType>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub readonly: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub omitted: Option<bool>,
    #[serde(default)]
    pub filterable: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub multiple: Option<bool>,
    /// Many-to-one selectors: attribute used as the option label.
    #[serde(default)]
    pub option_label: Option<OptionLabel>,
    /// Many-to-one selectors: `order_by` / `where` scoping the option list.
    #[serde(default)]
    pub query_opts: Option<QueryOpts>,
    #[serde(skip)]
    pub renderer: Option<Renderer>,
}

impl FieldConfig {
    pub fn new(name: &str) -> Self {
        FieldConfig {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn field_type(mut self, v: FieldType) -> Self {
        self.field_type = Some(v);
        self
    }

    pub fn html_type(mut self, v: HtmlType) -> Self {
        self.html_type = Some(v);
        self
    }

    pub fn label(mut self, v: &str) -> Self {
        self.label = Some(v.to_string());
        self
    }

    pub fn length(mut self, v: u32) -> Self {
        self.length = Some(v);
        self
    }

    pub fn required(mut self, v: bool) -> Self {
        self.required = Some(v);
        self
    }

    pub fn readonly(mut self, v: bool) -> Self {
        self.readonly = Some(v);
        self
    }

    pub fn disabled(mut self, v: bool) -> Self {
        self.disabled = Some(v);
        self
    }

    pub fn hidden(mut self, v: bool) -> Self {
        self.hidden = Some(v);
        self
    }

    pub fn omitted(mut self, v: bool) -> Self {
        self.omitted = Some(v);
        self
    }

    pub fn options<I: IntoIterator<Item = SelectOption>>(mut self, options: I) -> Self {
        self.options = Some(options.into_iter().collect());
        self
    }

    pub fn option_label(mut self, v: OptionLabel) -> Self {
        self.option_label = Some(v);
        self
    }

    pub fn query_opts(mut self, v: QueryOpts) -> Self {
        self.query_opts = Some(v);
        self
    }

    pub fn renderer(mut self, v: Renderer) -> Self {
        self.renderer = Some(v);
        self
    }
}

/// Declaration of one UI-facing resource. Supplying `schema` selects the simple-schema
/// backend; supplying `resource` selects the declarative-action backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub schema: Option<SchemaRef>,
    #[serde(default)]
    pub context: Option<ContextRef>,
    #[serde(default)]
    pub resource: Option<SchemaRef>,
    #[serde(default)]
    pub domain: Option<ContextRef>,
    /// Declared fields, in the order they should appear.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Operation overrides keyed by logical name or alias (`list`, `list_function`, `list_action`, ...).
    #[serde(default)]
    pub operations: HashMap<String, Option<String>>,
    #[serde(default)]
    pub opts: Map<String, Value>,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(skip)]
    pub new_initializer: Option<InitializerFn>,
}

impl ResourceConfig {
    pub fn simple(name: &str, schema: &str, context: Option<&str>) -> Self {
        ResourceConfig {
            name: name.to_string(),
            schema: Some(SchemaRef::from(schema)),
            context: context.map(ContextRef::from),
            ..Default::default()
        }
    }

    pub fn declarative(name: &str, resource: &str, domain: Option<&str>) -> Self {
        ResourceConfig {
            name: name.to_string(),
            resource: Some(SchemaRef::from(resource)),
            domain: domain.map(ContextRef::from),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    pub fn operation(mut self, key: &str, name: Option<&str>) -> Self {
        self.operations.insert(key.to_string(), name.map(str::to_string));
        self
    }

    pub fn opt(mut self, key: &str, value: Value) -> Self {
        self.opts.insert(key.to_string(), value);
        self
    }

    pub fn routes(mut self, routes: RoutesConfig) -> Self {
        self.routes = routes;
        self
    }

    pub fn new_with(mut self, initializer: InitializerFn) -> Self {
        self.new_initializer = Some(initializer);
        self
    }

    pub fn field_config(&self, key: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == key)
    }

    /// Backend kind, schema and context chosen by which keys were supplied.
    pub fn backend(&self) -> Result<(BackendKind, SchemaRef, Option<ContextRef>), ConfigError> {
        match (&self.schema, &self.resource) {
            (Some(schema), None) => Ok((BackendKind::SimpleSchema, schema.clone(), self.context.clone())),
            (None, Some(resource)) => Ok((
                BackendKind::DeclarativeAction,
                resource.clone(),
                self.domain.clone(),
            )),
            (Some(_), Some(_)) => Err(ConfigError::Validation(format!(
                "resource '{}' sets both schema and resource",
                self.name
            ))),
            (None, None) => Err(ConfigError::Validation(format!(
                "resource '{}' needs a schema or a resource",
                self.name
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NamingPolicyConfig {
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub hidden: Vec<String>,
    #[serde(default)]
    pub omitted: Vec<String>,
}

/// Everything one declaring module contributes, in one struct.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub layouts: Vec<LayoutConfig>,
    #[serde(default)]
    pub naming_policy: NamingPolicyConfig,
}

impl AppConfig {
    pub fn resource(mut self, resource: ResourceConfig) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layouts.push(layout);
        self
    }
}
