//! Config validation: referential integrity between declarations and the available backends.

use crate::backend::Backends;
use crate::case::EMBED_SEPARATOR;
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::operation::LogicalOp;
use std::collections::HashSet;

pub fn validate(config: &AppConfig, backends: &Backends) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for resource in &config.resources {
        if resource.name.is_empty() {
            return Err(ConfigError::Validation("resource name must not be empty".into()));
        }
        if resource.name.contains(EMBED_SEPARATOR) {
            return Err(ConfigError::Validation(format!(
                "resource name '{}' must not contain '{}' (reserved for embeds)",
                resource.name, EMBED_SEPARATOR
            )));
        }
        if !names.insert(resource.name.as_str()) {
            return Err(ConfigError::DuplicateResource(resource.name.clone()));
        }

        let (kind, schema, _) = resource.backend()?;
        let adapter = backends.get(kind).ok_or_else(|| ConfigError::UnsupportedBackend {
            resource: resource.name.clone(),
            kind: kind.as_str(),
        })?;
        if !adapter.has_schema(&schema) {
            return Err(ConfigError::MissingReference {
                kind: "schema",
                id: schema.to_string(),
            });
        }

        let mut declared = HashSet::new();
        for field in &resource.fields {
            if !declared.insert(field.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "resource '{}' declares field '{}' twice",
                    resource.name, field.name
                )));
            }
        }

        for key in resource.operations.keys() {
            if LogicalOp::from_override_key(key).is_none() {
                return Err(ConfigError::Validation(format!(
                    "resource '{}': unknown operation key '{}'",
                    resource.name, key
                )));
            }
        }
    }

    let mut layouts = HashSet::new();
    for layout in &config.layouts {
        let root = layout
            .resource
            .split(EMBED_SEPARATOR)
            .next()
            .unwrap_or_default();
        if !names.contains(root) {
            return Err(ConfigError::MissingReference {
                kind: "resource",
                id: layout.resource.clone(),
            });
        }
        if !layouts.insert(layout.resource.as_str()) {
            return Err(ConfigError::Validation(format!(
                "layout for '{}' declared twice",
                layout.resource
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SchemaCatalog, SimpleSchemaAdapter};
    use crate::config::{FieldConfig, LayoutConfig, ResourceConfig};
    use serde_json::json;

    fn backends() -> Backends {
        let catalog: SchemaCatalog = serde_json::from_value(json!({
            "schemas": [{"name": "Inventory.Product", "fields": [{"name": "reference", "type": "string"}]}]
        }))
        .unwrap();
        Backends::new().with_simple(SimpleSchemaAdapter::new(catalog))
    }

    fn product() -> ResourceConfig {
        ResourceConfig::simple("product", "Inventory.Product", None)
    }

    #[test]
    fn accepts_consistent_config() {
        let config = AppConfig::default()
            .resource(product())
            .layout(LayoutConfig::new("product"));
        assert!(validate(&config, &backends()).is_ok());
    }

    #[test]
    fn rejects_duplicate_resources() {
        let config = AppConfig::default().resource(product()).resource(product());
        assert!(matches!(
            validate(&config, &backends()),
            Err(ConfigError::DuplicateResource(name)) if name == "product"
        ));
    }

    #[test]
    fn rejects_reserved_separator() {
        let config = AppConfig::default().resource(ResourceConfig::simple("a__b", "Inventory.Product", None));
        assert!(matches!(validate(&config, &backends()), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_missing_backend_and_schema() {
        let config = AppConfig::default().resource(ResourceConfig::declarative("product", "Shop.Product", None));
        assert!(matches!(
            validate(&config, &backends()),
            Err(ConfigError::UnsupportedBackend { .. })
        ));

        let config = AppConfig::default().resource(ResourceConfig::simple("order", "Sales.Order", None));
        assert!(matches!(
            validate(&config, &backends()),
            Err(ConfigError::MissingReference { kind: "schema", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_field_declarations_and_unknown_operation_keys() {
        let config = AppConfig::default().resource(
            product()
                .field(FieldConfig::new("reference"))
                .field(FieldConfig::new("reference")),
        );
        assert!(validate(&config, &backends()).is_err());

        let config = AppConfig::default().resource(product().operation("explode", Some("boom")));
        assert!(validate(&config, &backends()).is_err());
    }

    #[test]
    fn rejects_layouts_for_unknown_resources() {
        let config = AppConfig::default()
            .resource(product())
            .layout(LayoutConfig::new("order"));
        assert!(matches!(
            validate(&config, &backends()),
            Err(ConfigError::MissingReference { kind: "resource", .. })
        ));
    }
}
