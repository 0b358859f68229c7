//! Association resolution: relationship metadata -> association/embed fields, embedded
//! resource synthesis, and linking association fields to registered resources.

use crate::backend::{RelationshipKind, RelationshipMeta, SchemaRef};
use crate::case::{embed_name, to_snake_case};
use crate::config::FieldConfig;
use crate::error::ConfigError;
use crate::field::{
    apply_customization, base_field, default_length, html_type_for, AssociationData, EmbedData, Field, FieldData,
    FieldType, NamingPolicy,
};
use crate::registry::{Resource, ResourceRegistry};
use std::collections::HashMap;

fn field_type_for(kind: RelationshipKind) -> FieldType {
    match kind {
        RelationshipKind::ManyToOne => FieldType::ManyToOne,
        RelationshipKind::OneToMany => FieldType::OneToMany,
        RelationshipKind::EmbedOne => FieldType::EmbedOne,
        RelationshipKind::EmbedMany => FieldType::EmbedMany,
    }
}

/// Owner-side key of a many-to-one: explicit source attribute, else `<name>_id`.
fn foreign_key(rel: &RelationshipMeta) -> String {
    rel.source_attribute
        .clone()
        .unwrap_or_else(|| format!("{}_id", rel.name))
}

/// Field key a relationship is stored under. A many-to-one takes over its foreign-key
/// attribute when that attribute was discovered; everything else is keyed by name.
pub fn relationship_key(rel: &RelationshipMeta, discovered: &HashMap<String, Field>) -> String {
    if rel.kind == RelationshipKind::ManyToOne {
        let fk = foreign_key(rel);
        if discovered.contains_key(&fk) {
            return fk;
        }
    }
    rel.name.clone()
}

/// Build the field for one relationship of `owner` (a resource named `owner_name`).
/// `existing` is the attribute field being upgraded, if any. Association targets stay
/// unresolved until [`link_associations`] runs.
pub fn relationship_field(
    owner_name: &str,
    owner_schema: &SchemaRef,
    rel: &RelationshipMeta,
    key: &str,
    existing: Option<Field>,
    custom: Option<&FieldConfig>,
    policy: &NamingPolicy,
) -> Field {
    let field_type = field_type_for(rel.kind);
    let html_type = html_type_for(&field_type);
    let mut field = match existing {
        Some(mut f) => {
            f.field_type = field_type.clone();
            f.html_type = html_type;
            f.length = default_length(&field_type);
            f.precision = 0;
            f.scale = 0;
            f
        }
        None => base_field(key, field_type.clone(), html_type, default_length(&field_type), policy),
    };
    field.filterable = rel.kind == RelationshipKind::ManyToOne;

    field.data = match rel.kind {
        RelationshipKind::ManyToOne => FieldData::Association(AssociationData {
            resource: None,
            owner_key: foreign_key(rel),
            related: rel.destination.clone(),
            related_key: rel.destination_attribute.clone().unwrap_or_else(|| "id".into()),
            option_label: custom.and_then(|c| c.option_label.clone()),
            query_opts: custom.and_then(|c| c.query_opts.clone()).unwrap_or_default(),
        }),
        RelationshipKind::OneToMany => {
            let owner = owner_schema.as_str().rsplit('.').next().unwrap_or_default();
            FieldData::Association(AssociationData {
                resource: None,
                owner_key: rel.source_attribute.clone().unwrap_or_else(|| "id".into()),
                related: rel.destination.clone(),
                related_key: rel
                    .destination_attribute
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", to_snake_case(owner))),
                option_label: custom.and_then(|c| c.option_label.clone()),
                query_opts: custom.and_then(|c| c.query_opts.clone()).unwrap_or_default(),
            })
        }
        RelationshipKind::EmbedOne | RelationshipKind::EmbedMany => FieldData::Embed(EmbedData {
            owner: owner_name.to_string(),
            resource: embed_name(owner_name, &rel.name),
            related: rel.destination.clone(),
        }),
    };

    if let Some(custom) = custom {
        apply_customization(&mut field, custom);
    }
    field
}

/// Synthesize the resources for every embed under `parent`, depth-first, parents before
/// children. `chain` holds the schemas on the current embed path (starting with the
/// parent's) and a repeat is a cycle.
pub fn synthesize_embeds(
    parent: &Resource,
    policy: &NamingPolicy,
    chain: &mut Vec<SchemaRef>,
    out: &mut Vec<Resource>,
) -> Result<(), ConfigError> {
    for field in parent.ordered_fields() {
        let Some(embed) = field.embed() else {
            continue;
        };
        if chain.contains(&embed.related) {
            let mut cycle: Vec<String> = chain.iter().map(ToString::to_string).collect();
            cycle.push(embed.related.to_string());
            return Err(ConfigError::EmbedCycle { chain: cycle });
        }

        let child = Resource::discover(
            &embed.resource,
            parent.adapter.clone(),
            embed.related.clone(),
            parent.context.clone(),
            None,
            policy,
            Some(parent.name.clone()),
        );
        tracing::debug!(parent = %parent.name, resource = %child.name, "synthesized embedded resource");

        let at = out.len();
        chain.push(embed.related.clone());
        let nested = synthesize_embeds(&child, policy, chain, out);
        chain.pop();
        nested?;
        out.insert(at, child);
    }
    Ok(())
}

/// Point every association field at the registered resource for its related schema.
/// Targets with no registered resource stay `None`.
pub fn link_associations(registry: &mut ResourceRegistry) {
    let mut links = Vec::new();
    for resource in registry.iter() {
        for field in resource.fields.values() {
            let Some(assoc) = field.association() else {
                continue;
            };
            let target = registry.find_by_schema(&assoc.related).map(|r| r.name.clone());
            if target.is_none() {
                tracing::debug!(
                    resource = %resource.name,
                    field = %field.key,
                    related = %assoc.related,
                    "no resource registered for related schema"
                );
            }
            links.push((resource.name.clone(), field.key.clone(), target));
        }
    }

    for (resource, key, target) in links {
        let field = registry
            .get_mut(&resource)
            .and_then(|r| r.fields.get_mut(&key));
        if let Some(Field {
            data: FieldData::Association(assoc),
            ..
        }) = field
        {
            assoc.resource = target;
        }
    }
}
