//! Declarative-action adapter: resources declare attributes, relationships and typed actions
//! (with primary/pagination metadata); domains expose resources and named code interfaces.

use crate::backend::{
    ActionKind, ActionMeta, ActionTarget, AttributeMeta, BackendAdapter, BackendKind, ContextRef,
    RelationshipMeta, SchemaRef,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub domains: Vec<DomainDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: SchemaRef,
    pub attributes: Vec<AttributeMeta>,
    #[serde(default)]
    pub relationships: Vec<RelationshipMeta>,
    #[serde(default)]
    pub actions: Vec<ActionMeta>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainDef {
    pub name: ContextRef,
    #[serde(default)]
    pub resources: Vec<SchemaRef>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDef>,
}

/// A domain-level name bound to one action of one resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: String,
    pub resource: SchemaRef,
    pub action: String,
    #[serde(default)]
    pub arity: Option<u8>,
}

#[derive(Debug)]
pub struct DeclarativeActionAdapter {
    catalog: ActionCatalog,
    resource_index: HashMap<SchemaRef, usize>,
}

impl DeclarativeActionAdapter {
    pub fn new(catalog: ActionCatalog) -> Self {
        let resource_index = catalog
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        DeclarativeActionAdapter {
            catalog,
            resource_index,
        }
    }

    fn resource(&self, schema: &SchemaRef) -> Option<&ResourceDef> {
        self.resource_index
            .get(schema)
            .map(|i| &self.catalog.resources[*i])
    }

    fn domain(&self, domain: &ContextRef) -> Option<&DomainDef> {
        self.catalog.domains.iter().find(|d| &d.name == domain)
    }

    /// Whether `domain` exposes `action` of `schema`. A domain that lists a resource without
    /// any interface for it exposes all of its actions.
    fn exposes(domain: &DomainDef, schema: &SchemaRef, action: &str) -> bool {
        let mut interfaces = domain.interfaces.iter().filter(|i| &i.resource == schema).peekable();
        if interfaces.peek().is_none() {
            return domain.resources.contains(schema);
        }
        interfaces.any(|i| i.action == action)
    }
}

impl BackendAdapter for DeclarativeActionAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::DeclarativeAction
    }

    fn has_schema(&self, schema: &SchemaRef) -> bool {
        self.resource_index.contains_key(schema)
    }

    fn list_attributes(&self, schema: &SchemaRef) -> Vec<AttributeMeta> {
        self.resource(schema)
            .map(|r| r.attributes.clone())
            .unwrap_or_default()
    }

    fn list_relationships(&self, schema: &SchemaRef) -> Vec<RelationshipMeta> {
        self.resource(schema)
            .map(|r| r.relationships.clone())
            .unwrap_or_default()
    }

    fn list_actions(
        &self,
        schema: &SchemaRef,
        context: Option<&ContextRef>,
        kind: ActionKind,
    ) -> Vec<ActionMeta> {
        let Some(resource) = self.resource(schema) else {
            return Vec::new();
        };
        let domain = match context {
            Some(name) => match self.domain(name) {
                Some(d) => Some(d),
                None => return Vec::new(),
            },
            None => None,
        };
        resource
            .actions
            .iter()
            .filter(|a| a.kind == kind)
            .filter(|a| domain.map_or(true, |d| Self::exposes(d, schema, &a.name)))
            .cloned()
            .collect()
    }

    fn resolve_action_target(&self, context: &ContextRef, name: &str) -> Option<ActionTarget> {
        let interface = self
            .domain(context)?
            .interfaces
            .iter()
            .find(|i| i.name == name)?;
        Some(ActionTarget {
            schema: Some(interface.resource.clone()),
            action: interface.action.clone(),
            arity: interface.arity,
        })
    }
}
