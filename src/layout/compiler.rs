//! Layout compiler: declared (or default) layouts -> validated [`LayoutTree`]s.

use super::{LayoutNode, LayoutTag, LayoutTree, NodeConfig, ViewKind};
use crate::config::{IndexLayoutConfig, LayoutConfig, LayoutItem};
use crate::error::ConfigError;
use crate::field::{Field, FieldType};
use crate::registry::{Resource, ResourceRegistry};
use serde_json::{Map, Value};

type Opts = Map<String, Value>;

/// Compile one view of `resource`. Views without a declaration get the default layout.
pub fn compile_layout(
    resource: &Resource,
    view: ViewKind,
    declared: Option<&LayoutConfig>,
    registry: &ResourceRegistry,
) -> Result<LayoutTree, ConfigError> {
    let mut compiler = Compiler {
        resource,
        registry,
        view,
        sections: 0,
    };
    let root = match view {
        ViewKind::Index => compiler.index(declared.and_then(|l| l.index.as_ref()))?,
        ViewKind::Show => compiler.view(declared.and_then(|l| l.show.as_deref()))?,
        ViewKind::Form => compiler.view(declared.and_then(|l| l.form.as_deref()))?,
    };
    Ok(LayoutTree {
        resource: resource.name.clone(),
        view,
        root,
    })
}

/// Nearest declaration wins.
fn merge(inherited: &Opts, own: &Opts) -> Opts {
    let mut opts = inherited.clone();
    for (k, v) in own {
        opts.insert(k.clone(), v.clone());
    }
    opts
}

/// Fields shown in a default show/form view. Relationship fields whose target was never
/// registered have nothing to render.
fn default_detail_field(field: &Field) -> bool {
    if field.omitted {
        return false;
    }
    match field.field_type {
        FieldType::OneToMany | FieldType::EmbedOne | FieldType::EmbedMany => field.related_resource().is_some(),
        _ => true,
    }
}

struct Compiler<'a> {
    resource: &'a Resource,
    registry: &'a ResourceRegistry,
    view: ViewKind,
    /// Sections containers seen so far in this tree.
    sections: usize,
}

impl<'a> Compiler<'a> {
    fn malformed(&self, reason: String) -> ConfigError {
        ConfigError::MalformedLayout {
            resource: self.resource.name.clone(),
            reason,
        }
    }

    fn root(&self, opts: Opts, inner_elements: Vec<LayoutNode>) -> LayoutNode {
        LayoutNode {
            tag: self.view.tag(),
            name: self.resource.name.clone(),
            config: NodeConfig::View {
                resource: self.resource.name.clone(),
            },
            opts,
            inner_elements,
        }
    }

    fn index(&mut self, declared: Option<&IndexLayoutConfig>) -> Result<LayoutNode, ConfigError> {
        let Some(declared) = declared else {
            let opts = self.resource.opts.clone();
            let columns = self
                .resource
                .ordered_fields()
                .filter(|f| !f.omitted && !f.field_type.is_association())
                .map(|f| self.field_node(f, &opts))
                .collect();
            return Ok(self.root(opts, columns));
        };

        if declared.columns.is_empty() {
            return Err(self.malformed("index declares no columns".into()));
        }
        let opts = merge(&self.resource.opts, &declared.opts);
        let mut columns = Vec::with_capacity(declared.columns.len());
        for item in &declared.columns {
            match item {
                LayoutItem::Field { name, opts: own } => columns.push(self.field(name, own, &opts)?),
                _ => return Err(self.malformed("index columns must be fields".into())),
            }
        }
        Ok(self.root(opts, columns))
    }

    fn view(&mut self, declared: Option<&[LayoutItem]>) -> Result<LayoutNode, ConfigError> {
        let inherited = Opts::new();
        let child = match declared {
            None => LayoutNode {
                tag: LayoutTag::Stacked,
                name: "stacked".into(),
                config: NodeConfig::None,
                opts: Opts::new(),
                inner_elements: self
                    .resource
                    .ordered_fields()
                    .filter(|f| default_detail_field(f))
                    .map(|f| self.field_node(f, &inherited))
                    .collect(),
            },
            Some([]) => return Err(self.malformed(format!("{} view declares no items", self.view))),
            Some([single]) if !matches!(single, LayoutItem::Field { .. } | LayoutItem::Section { .. }) => {
                self.item(single, &inherited)?
            }
            Some(items) => {
                let mut inner_elements = Vec::with_capacity(items.len());
                for item in items {
                    inner_elements.push(self.item(item, &inherited)?);
                }
                LayoutNode {
                    tag: LayoutTag::Stacked,
                    name: "stacked".into(),
                    config: NodeConfig::None,
                    opts: Opts::new(),
                    inner_elements,
                }
            }
        };
        Ok(self.root(inherited, vec![child]))
    }

    fn item(&mut self, item: &LayoutItem, inherited: &Opts) -> Result<LayoutNode, ConfigError> {
        match item {
            LayoutItem::Field { name, opts } => self.field(name, opts, inherited),
            LayoutItem::Stacked { items, opts } => {
                self.container(LayoutTag::Stacked, "stacked".into(), NodeConfig::None, items, opts, inherited)
            }
            LayoutItem::Inline { items, opts } => {
                self.container(LayoutTag::Inline, "inline".into(), NodeConfig::None, items, opts, inherited)
            }
            LayoutItem::Group { title, items, opts } => self.container(
                LayoutTag::Group,
                title.clone(),
                NodeConfig::Group { title: title.clone() },
                items,
                opts,
                inherited,
            ),
            LayoutItem::Sections { items, opts } => self.sections(items, opts, inherited),
            LayoutItem::Section { label, .. } => {
                Err(self.malformed(format!("section '{}' outside of a sections container", label)))
            }
        }
    }

    fn container(
        &mut self,
        tag: LayoutTag,
        name: String,
        config: NodeConfig,
        items: &[LayoutItem],
        own: &Opts,
        inherited: &Opts,
    ) -> Result<LayoutNode, ConfigError> {
        if items.is_empty() {
            return Err(self.malformed(format!("empty {} container '{}'", tag_name(tag), name)));
        }
        let opts = merge(inherited, own);
        let mut inner_elements = Vec::with_capacity(items.len());
        for item in items {
            inner_elements.push(self.item(item, &opts)?);
        }
        Ok(LayoutNode {
            tag,
            name,
            config,
            opts,
            inner_elements,
        })
    }

    fn sections(&mut self, items: &[LayoutItem], own: &Opts, inherited: &Opts) -> Result<LayoutNode, ConfigError> {
        let sections_id = format!("{}-{}-sections-{}", self.resource.name, self.view, self.sections);
        self.sections += 1;
        if items.is_empty() {
            return Err(self.malformed(format!("empty sections container '{}'", sections_id)));
        }

        let opts = merge(inherited, own);
        let explicit = items
            .iter()
            .any(|i| matches!(i, LayoutItem::Section { active: Some(true), .. }));
        let mut tabs = Vec::with_capacity(items.len());
        for (tab_index, item) in items.iter().enumerate() {
            let LayoutItem::Section {
                label,
                active,
                items: section_items,
                opts: section_opts,
            } = item
            else {
                return Err(self.malformed(format!("{} may only contain sections", sections_id)));
            };
            let tab_id = format!("{}-tab-{}", sections_id, tab_index);
            let active = if explicit {
                active.unwrap_or(false)
            } else {
                active.unwrap_or(tab_index == 0)
            };
            let config = NodeConfig::Section {
                label: label.clone(),
                tab_index,
                tab_id: tab_id.clone(),
                sections_id: sections_id.clone(),
                active,
            };
            tabs.push(self.container(LayoutTag::Section, tab_id, config, section_items, section_opts, &opts)?);
        }

        Ok(LayoutNode {
            tag: LayoutTag::Sections,
            name: sections_id.clone(),
            config: NodeConfig::Sections { sections_id },
            opts,
            inner_elements: tabs,
        })
    }

    fn field(&self, name: &str, own: &Opts, inherited: &Opts) -> Result<LayoutNode, ConfigError> {
        let field = self.resource.field(name).ok_or_else(|| ConfigError::UnknownField {
            resource: self.resource.name.clone(),
            field: name.to_string(),
        })?;
        if field.omitted {
            return Err(ConfigError::OmittedField {
                resource: self.resource.name.clone(),
                field: name.to_string(),
            });
        }
        if let Some(embed) = field.embed() {
            if !self.registry.contains(&embed.resource) {
                return Err(ConfigError::MissingReference {
                    kind: "resource",
                    id: embed.resource.clone(),
                });
            }
        }
        Ok(self.field_node(field, &merge(inherited, own)))
    }

    fn field_node(&self, field: &Field, opts: &Opts) -> LayoutNode {
        LayoutNode {
            tag: LayoutTag::Field,
            name: field.key.clone(),
            config: NodeConfig::Field {
                resource: field.related_resource().map(str::to_string),
            },
            opts: opts.clone(),
            inner_elements: Vec::new(),
        }
    }
}

fn tag_name(tag: LayoutTag) -> &'static str {
    match tag {
        LayoutTag::Stacked => "stacked",
        LayoutTag::Inline => "inline",
        LayoutTag::Group => "group",
        LayoutTag::Section => "section",
        LayoutTag::Sections => "sections",
        LayoutTag::Field => "field",
        LayoutTag::Index => "index",
        LayoutTag::Show => "show",
        LayoutTag::Form => "form",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendAdapter, SchemaCatalog, SchemaRef, SimpleSchemaAdapter};
    use crate::config::FieldConfig;
    use crate::field::NamingPolicy;
    use crate::config::ResourceConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn registry() -> ResourceRegistry {
        let catalog: SchemaCatalog = serde_json::from_value(json!({
            "schemas": [
                {
                    "name": "Inventory.Product",
                    "fields": [
                        {"name": "id", "type": "id", "primary_key": true},
                        {"name": "reference", "type": "string"},
                        {"name": "name", "type": "string"},
                        {"name": "description", "type": "string"},
                        {"name": "price", "type": "decimal"},
                        {"name": "category_id", "type": "integer"},
                        {"name": "inserted_at", "type": "utc_datetime"}
                    ],
                    "associations": [
                        {"name": "category", "kind": "many_to_one", "destination": "Inventory.Category"},
                        {"name": "reviews", "kind": "one_to_many", "destination": "Inventory.Review"}
                    ]
                },
                {"name": "Inventory.Category", "fields": [{"name": "name", "type": "string"}]}
            ]
        }))
        .unwrap();
        let adapter: Arc<dyn BackendAdapter> = Arc::new(SimpleSchemaAdapter::new(catalog));
        let config = ResourceConfig::simple("product", "Inventory.Product", None)
            .opt("order_by", json!("name"))
            .field(FieldConfig::new("inserted_at").omitted(true));
        let product = Resource::discover(
            "product",
            adapter,
            SchemaRef::from("Inventory.Product"),
            None,
            Some(&config),
            &NamingPolicy::default(),
            None,
        );
        let mut registry = ResourceRegistry::default();
        registry.insert(product).unwrap();
        registry
    }

    fn compile(view: ViewKind, layout: Option<LayoutConfig>) -> Result<LayoutTree, ConfigError> {
        let registry = registry();
        let product = registry.get("product").unwrap();
        compile_layout(product, view, layout.as_ref(), &registry)
    }

    fn field(name: &str) -> LayoutItem {
        LayoutItem::field(name)
    }

    #[test]
    fn default_index_lists_plain_fields() {
        let tree = compile(ViewKind::Index, None).unwrap();
        assert_eq!(tree.root.tag, LayoutTag::Index);
        assert_eq!(tree.root.name, "product");
        assert_eq!(tree.field_names(), vec!["id", "reference", "name", "description", "price"]);
        assert_eq!(tree.root.opts.get("order_by"), Some(&json!("name")));
    }

    #[test]
    fn default_detail_view_skips_unresolved_one_to_many() {
        let tree = compile(ViewKind::Form, None).unwrap();
        assert_eq!(tree.root.tag, LayoutTag::Form);
        assert_eq!(tree.root.inner_elements.len(), 1);
        assert_eq!(tree.root.inner_elements[0].tag, LayoutTag::Stacked);
        assert_eq!(
            tree.field_names(),
            vec!["id", "reference", "name", "description", "price", "category_id"]
        );
    }

    #[test]
    fn several_top_level_items_get_an_implicit_stack() {
        let layout = LayoutConfig::new("product").show(vec![
            field("reference"),
            LayoutItem::inline(vec![field("name"), field("price")]),
        ]);
        let tree = compile(ViewKind::Show, Some(layout)).unwrap();
        let stacked = &tree.root.inner_elements[0];
        assert_eq!(stacked.tag, LayoutTag::Stacked);
        assert_eq!(stacked.inner_elements[1].tag, LayoutTag::Inline);
        assert_eq!(tree.field_names(), vec!["reference", "name", "price"]);

        let single = LayoutConfig::new("product").show(vec![LayoutItem::group("Main", vec![field("name")])]);
        let tree = compile(ViewKind::Show, Some(single)).unwrap();
        assert_eq!(tree.root.inner_elements[0].tag, LayoutTag::Group);
        assert_eq!(tree.root.inner_elements[0].config, NodeConfig::Group { title: "Main".into() });
    }

    #[test]
    fn sections_get_tab_ids_and_a_default_active_tab() {
        let layout = LayoutConfig::new("product").form(vec![LayoutItem::sections(vec![
            LayoutItem::section("Details", vec![field("reference"), field("name")]),
            LayoutItem::section("Pricing", vec![field("price")]),
        ])]);
        let tree = compile(ViewKind::Form, Some(layout)).unwrap();
        let sections = &tree.root.inner_elements[0];
        assert_eq!(sections.name, "product-form-sections-0");
        let tabs: Vec<_> = sections
            .inner_elements
            .iter()
            .map(|t| match &t.config {
                NodeConfig::Section {
                    tab_index,
                    tab_id,
                    active,
                    sections_id,
                    ..
                } => (*tab_index, tab_id.as_str(), *active, sections_id.as_str()),
                other => panic!("unexpected config {other:?}"),
            })
            .collect();
        assert_eq!(
            tabs,
            vec![
                (0, "product-form-sections-0-tab-0", true, "product-form-sections-0"),
                (1, "product-form-sections-0-tab-1", false, "product-form-sections-0"),
            ]
        );
    }

    #[test]
    fn explicit_active_section_wins_and_ids_stay_unique() {
        let layout = LayoutConfig::new("product").show(vec![
            LayoutItem::sections(vec![
                LayoutItem::section("A", vec![field("reference")]),
                LayoutItem::section("B", vec![field("name")]).active(true),
            ]),
            LayoutItem::sections(vec![LayoutItem::section("C", vec![field("price")])]),
        ]);
        let tree = compile(ViewKind::Show, Some(layout)).unwrap();
        let first = &tree.root.inner_elements[0].inner_elements[0];
        let active: Vec<bool> = first
            .inner_elements
            .iter()
            .map(|t| matches!(t.config, NodeConfig::Section { active: true, .. }))
            .collect();
        assert_eq!(active, vec![false, true]);

        let mut ids = HashSet::new();
        let mut stack = vec![&tree.root];
        while let Some(node) = stack.pop() {
            if node.tag == LayoutTag::Section {
                assert!(ids.insert(node.name.clone()), "duplicate tab id {}", node.name);
            }
            stack.extend(node.inner_elements.iter());
        }
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("product-show-sections-1-tab-0"));
    }

    #[test]
    fn opts_flow_down_with_nearest_declaration_winning() {
        let layout = LayoutConfig::new("product").form(vec![LayoutItem::group(
            "Main",
            vec![
                field("category_id"),
                LayoutItem::inline(vec![field("name").with_opt("readonly", json!(false))])
                    .with_opt("readonly", json!(true)),
            ],
        )
        .with_opt("order_by", json!("name"))
        .with_opt("readonly", json!("group"))]);
        let tree = compile(ViewKind::Form, Some(layout)).unwrap();
        let category = tree.root.find_field("category_id").unwrap();
        assert_eq!(category.opts.get("order_by"), Some(&json!("name")));
        assert_eq!(category.opts.get("readonly"), Some(&json!("group")));
        let name = tree.root.find_field("name").unwrap();
        assert_eq!(name.opts.get("readonly"), Some(&json!(false)));
        assert_eq!(name.opts.get("order_by"), Some(&json!("name")));
    }

    #[test]
    fn index_opts_override_resource_opts() {
        let layout = LayoutConfig::new("product").index(
            vec![field("reference"), field("price")],
            serde_json::from_value(json!({"order_by": [["price", "desc"]]})).unwrap(),
        );
        let tree = compile(ViewKind::Index, Some(layout)).unwrap();
        assert_eq!(tree.field_names(), vec!["reference", "price"]);
        assert_eq!(
            tree.root.opts.get("order_by"),
            Some(&json!([["price", "desc"]]))
        );
    }

    #[test]
    fn invalid_references_are_rejected() {
        let unknown = LayoutConfig::new("product").form(vec![field("nope")]);
        assert!(matches!(
            compile(ViewKind::Form, Some(unknown)),
            Err(ConfigError::UnknownField { field, .. }) if field == "nope"
        ));

        let omitted = LayoutConfig::new("product").index(vec![field("inserted_at")], Map::new());
        assert!(matches!(
            compile(ViewKind::Index, Some(omitted)),
            Err(ConfigError::OmittedField { .. })
        ));
    }

    #[test]
    fn malformed_structures_are_rejected() {
        let cases = vec![
            (ViewKind::Form, LayoutConfig::new("product").form(vec![LayoutItem::section("Lonely", vec![field("name")])])),
            (
                ViewKind::Form,
                LayoutConfig::new("product").form(vec![LayoutItem::sections(vec![field("name")])]),
            ),
            (ViewKind::Show, LayoutConfig::new("product").show(vec![LayoutItem::stacked(vec![])])),
            (ViewKind::Show, LayoutConfig::new("product").show(vec![])),
            (
                ViewKind::Index,
                LayoutConfig::new("product").index(vec![LayoutItem::inline(vec![field("name")])], Map::new()),
            ),
        ];
        for (view, layout) in cases {
            let result = compile(view, Some(layout.clone()));
            assert!(
                matches!(result, Err(ConfigError::MalformedLayout { .. })),
                "{layout:?} gave {result:?}"
            );
        }
    }
}
