//! Resource registry: every UI-facing resource (declared and embedded) with its resolved
//! fields, operations and routes, keyed by name.

use crate::association::{link_associations, relationship_field, relationship_key, synthesize_embeds};
use crate::backend::{BackendAdapter, BackendKind, Backends, ContextRef, SchemaRef};
use crate::config::{AppConfig, ResourceConfig};
use crate::error::ConfigError;
use crate::field::{declared_field, resolve_field, Field, NamingPolicy};
use crate::operation::{required_ops, resolve_operation, LogicalOp, OperationOverrides, OperationReference, OperationScope};
use crate::query::QueryOpts;
use crate::routes::RouteAction;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize)]
pub struct Resource {
    pub name: String,
    pub backend: BackendKind,
    pub schema: SchemaRef,
    pub context: Option<ContextRef>,
    pub fields: HashMap<String, Field>,
    /// Declared fields first (declaration order), then discovered ones (discovery order).
    pub fields_order: Vec<String>,
    pub operations: BTreeMap<LogicalOp, OperationReference>,
    pub routes: Vec<RouteAction>,
    pub opts: Map<String, Value>,
    /// Owning resource, for embedded resources.
    pub parent: Option<String>,
    #[serde(skip)]
    pub adapter: Arc<dyn BackendAdapter>,
}

impl Resource {
    /// Discover fields for `schema` through `adapter` and merge the declaration on top.
    /// Operations and routes are left empty.
    pub fn discover(
        name: &str,
        adapter: Arc<dyn BackendAdapter>,
        schema: SchemaRef,
        context: Option<ContextRef>,
        config: Option<&ResourceConfig>,
        policy: &NamingPolicy,
        parent: Option<String>,
    ) -> Resource {
        let custom = |key: &str| config.and_then(|c| c.field_config(key));

        let mut fields = HashMap::new();
        let mut discovered = Vec::new();
        for attr in adapter.list_attributes(&schema) {
            let field = resolve_field(&attr, custom(&attr.name), policy);
            discovered.push(attr.name.clone());
            fields.insert(attr.name, field);
        }
        for rel in adapter.list_relationships(&schema) {
            let key = relationship_key(&rel, &fields);
            let existing = fields.remove(&key);
            if existing.is_none() {
                discovered.push(key.clone());
            }
            let field = relationship_field(name, &schema, &rel, &key, existing, custom(&key), policy);
            fields.insert(key, field);
        }

        let mut fields_order = Vec::with_capacity(fields.len());
        for declared in config.map(|c| c.fields.as_slice()).unwrap_or_default() {
            if !fields.contains_key(&declared.name) {
                tracing::warn!(resource = name, field = %declared.name, "declared field not exposed by the backend");
                fields.insert(declared.name.clone(), declared_field(declared, policy));
            }
            fields_order.push(declared.name.clone());
        }
        for key in discovered {
            if !fields_order.contains(&key) {
                fields_order.push(key);
            }
        }

        Resource {
            name: name.to_string(),
            backend: adapter.kind(),
            schema,
            context,
            fields,
            fields_order,
            operations: BTreeMap::new(),
            routes: Vec::new(),
            opts: config.map(|c| c.opts.clone()).unwrap_or_default(),
            parent,
            adapter,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Fields in `fields_order`.
    pub fn ordered_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields_order.iter().filter_map(|k| self.fields.get(k))
    }

    pub fn operation(&self, op: LogicalOp) -> Option<&OperationReference> {
        self.operations.get(&op)
    }

    pub fn is_embedded(&self) -> bool {
        self.parent.is_some()
    }

    pub fn paginated(&self) -> bool {
        self.opts.get("paginated").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Default listing options (`order_by` / `where`) from the resource opts.
    pub fn query_opts(&self) -> QueryOpts {
        QueryOpts::from_map(&self.opts)
    }

    fn attach_operations(&mut self, config: &ResourceConfig) -> Result<(), ConfigError> {
        self.routes = config.routes.manifest();
        let overrides = OperationOverrides::from_config(config);
        let scope = OperationScope {
            resource: &self.name,
            schema: &self.schema,
            context: self.context.as_ref(),
        };
        let mut operations = BTreeMap::new();
        for op in required_ops(&self.routes, self.paginated(), &overrides) {
            operations.insert(op, resolve_operation(self.adapter.as_ref(), &scope, op, &overrides)?);
        }
        self.operations = operations;
        Ok(())
    }
}

/// Registered resources in registration order: each declared resource followed by the
/// resources synthesized for its embeds.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResourceRegistry {
    resources: HashMap<String, Resource>,
    order: Vec<String>,
}

impl ResourceRegistry {
    /// Register every declared resource of `config`, synthesize embeds, link associations
    /// and resolve the operations each resource's routes need.
    pub fn build(config: &AppConfig, backends: &Backends, policy: &NamingPolicy) -> Result<Self, ConfigError> {
        let mut registry = ResourceRegistry::default();
        for declared in &config.resources {
            let (kind, schema, context) = declared.backend()?;
            let adapter = backends.get(kind).ok_or_else(|| ConfigError::UnsupportedBackend {
                resource: declared.name.clone(),
                kind: kind.as_str(),
            })?;
            let resource = Resource::discover(&declared.name, adapter, schema, context, Some(declared), policy, None);

            let mut embedded = Vec::new();
            synthesize_embeds(&resource, policy, &mut vec![resource.schema.clone()], &mut embedded)?;
            tracing::debug!(
                resource = %resource.name,
                backend = kind.as_str(),
                fields = resource.fields.len(),
                embeds = embedded.len(),
                "registered resource"
            );
            registry.insert(resource)?;
            for child in embedded {
                registry.insert(child)?;
            }
        }

        link_associations(&mut registry);

        for declared in &config.resources {
            if let Some(resource) = registry.get_mut(&declared.name) {
                resource.attach_operations(declared)?;
            }
        }
        Ok(registry)
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), ConfigError> {
        if self.resources.contains_key(&resource.name) {
            return Err(ConfigError::DuplicateResource(resource.name));
        }
        self.order.push(resource.name.clone());
        self.resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.order.iter().filter_map(|n| self.resources.get(n))
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// First declared (non-embedded) resource over `schema`.
    pub fn find_by_schema(&self, schema: &SchemaRef) -> Option<&Resource> {
        self.iter().find(|r| !r.is_embedded() && &r.schema == schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SchemaCatalog, SimpleSchemaAdapter};
    use crate::config::{FieldConfig, NamingPolicyConfig};
    use crate::field::FieldType;
    use crate::routes::RoutesConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn backends() -> Backends {
        let catalog: SchemaCatalog = serde_json::from_value(json!({
            "schemas": [
                {
                    "name": "Inventory.Product",
                    "fields": [
                        {"name": "id", "type": "id", "primary_key": true},
                        {"name": "reference", "type": "string"},
                        {"name": "name", "type": "string"},
                        {"name": "price", "type": "decimal"}
                    ]
                },
                {"name": "Inventory.Category", "plural": "categories", "fields": [{"name": "name", "type": "string"}]}
            ],
            "contexts": [{
                "name": "Inventory",
                "functions": [
                    {"name": "list_products", "arity": 1},
                    {"name": "get_product", "arity": 2},
                    {"name": "list_categories", "arity": 1}
                ]
            }]
        }))
        .unwrap();
        Backends::new().with_simple(SimpleSchemaAdapter::new(catalog))
    }

    #[test]
    fn declared_fields_lead_the_order() {
        let config = AppConfig::default().resource(
            ResourceConfig::simple("product", "Inventory.Product", Some("Inventory"))
                .field(FieldConfig::new("name"))
                .field(FieldConfig::new("stock").field_type(FieldType::Integer))
                .field(FieldConfig::new("reference"))
                .routes(RoutesConfig::only([RouteAction::Index, RouteAction::Show])),
        );
        let registry = ResourceRegistry::build(&config, &backends(), &NamingPolicy::default()).unwrap();
        let product = registry.get("product").unwrap();
        assert_eq!(product.fields_order, vec!["name", "stock", "reference", "id", "price"]);
        assert_eq!(product.field("stock").unwrap().field_type, FieldType::Integer);
        assert_eq!(
            product.operations.keys().copied().collect::<Vec<_>>(),
            vec![LogicalOp::List, LogicalOp::Get]
        );
        assert_eq!(product.routes, vec![RouteAction::Index, RouteAction::Show]);
    }

    #[test]
    fn missing_operation_for_an_enabled_route_fails_the_build() {
        let config = AppConfig::default().resource(ResourceConfig::simple("product", "Inventory.Product", Some("Inventory")));
        let err = ResourceRegistry::build(&config, &backends(), &NamingPolicy::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOperation { .. }), "{err}");
    }

    #[test]
    fn find_by_schema_uses_registration_order() {
        let only_index = RoutesConfig::only([RouteAction::Index]);
        let config = AppConfig::default()
            .resource(ResourceConfig::simple("category", "Inventory.Category", Some("Inventory")).routes(only_index.clone()))
            .resource(ResourceConfig::simple("tag", "Inventory.Category", Some("Inventory")).routes(only_index));
        let policy = NamingPolicy::from_config(&NamingPolicyConfig::default()).unwrap();
        let registry = ResourceRegistry::build(&config, &backends(), &policy).unwrap();
        assert_eq!(registry.names(), &["category".to_string(), "tag".to_string()]);
        assert_eq!(
            registry.find_by_schema(&"Inventory.Category".into()).map(|r| r.name.as_str()),
            Some("category")
        );
        assert!(registry.find_by_schema(&"Inventory.Missing".into()).is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let config = AppConfig::default()
            .resource(ResourceConfig::simple("category", "Inventory.Category", Some("Inventory")).routes(RoutesConfig::only(Vec::<RouteAction>::new())));
        let mut registry = ResourceRegistry::build(&config, &backends(), &NamingPolicy::default()).unwrap();
        let copy = registry.get("category").unwrap().clone();
        assert!(matches!(registry.insert(copy), Err(ConfigError::DuplicateResource(_))));
    }
}
