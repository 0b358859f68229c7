//! Compiled application schema: registry, layout trees and route manifests, built once from
//! declarative config and read-only afterwards.

use crate::backend::Backends;
use crate::config::{validate, AppConfig, LayoutConfig};
use crate::error::ConfigError;
use crate::field::NamingPolicy;
use crate::layout::{compile_layout, LayoutTree, ViewKind};
use crate::registry::{Resource, ResourceRegistry};
use crate::routes::RouteAction;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize)]
pub struct AppSchema {
    pub registry: ResourceRegistry,
    /// Layout trees by resource name, one per view.
    layouts: HashMap<String, HashMap<ViewKind, LayoutTree>>,
}

impl AppSchema {
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.registry.get(name)
    }

    pub fn layout(&self, resource: &str, view: ViewKind) -> Option<&LayoutTree> {
        self.layouts.get(resource).and_then(|views| views.get(&view))
    }

    /// Enabled routes of a resource; empty for unknown or embedded resources.
    pub fn routes(&self, resource: &str) -> &[RouteAction] {
        self.registry
            .get(resource)
            .map(|r| r.routes.as_slice())
            .unwrap_or_default()
    }

    /// `(resource, routes)` for every declared resource, in registration order.
    pub fn route_manifest(&self) -> Vec<(&str, &[RouteAction])> {
        self.registry
            .iter()
            .filter(|r| !r.is_embedded())
            .map(|r| (r.name.as_str(), r.routes.as_slice()))
            .collect()
    }
}

/// Validate `config`, resolve every resource through `backends` and compile all layouts.
/// Any inconsistency fails the whole compilation.
pub fn compile(config: &AppConfig, backends: &Backends) -> Result<AppSchema, ConfigError> {
    validate(config, backends)?;
    let policy = NamingPolicy::from_config(&config.naming_policy)?;
    let registry = ResourceRegistry::build(config, backends, &policy)?;

    let declared: HashMap<&str, &LayoutConfig> = config
        .layouts
        .iter()
        .map(|l| (l.resource.as_str(), l))
        .collect();
    for name in declared.keys() {
        if !registry.contains(name) {
            return Err(ConfigError::MissingReference {
                kind: "resource",
                id: name.to_string(),
            });
        }
    }

    let mut layouts = HashMap::with_capacity(registry.len());
    for resource in registry.iter() {
        let layout = declared.get(resource.name.as_str()).copied();
        let mut views = HashMap::with_capacity(ViewKind::ALL.len());
        for view in ViewKind::ALL {
            views.insert(view, compile_layout(resource, view, layout, &registry)?);
        }
        layouts.insert(resource.name.clone(), views);
    }

    tracing::info!(
        resources = registry.len(),
        layouts = declared.len(),
        "compiled application schema"
    );
    Ok(AppSchema { registry, layouts })
}
