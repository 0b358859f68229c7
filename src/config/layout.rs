//! Layout declarations: nested stacked / inline / group / sections containers over field names.
//!
//! JSON shape, per item:
//! `"name"`, `{"field": "name"}`, `{"field": {"name": .., "opts": {..}}}`,
//! `{"stacked": [..]}` or `{"stacked": {"items": [..], "opts": {..}}}` (same for `inline` and
//! `sections`), `{"group": {"title": .., "items": [..]}}`,
//! `{"section": {"label": .., "active": true, "items": [..]}}`.

use serde::Deserialize;
use serde_json::{Map, Value};

type Opts = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawItem")]
pub enum LayoutItem {
    Field { name: String, opts: Opts },
    Stacked { items: Vec<LayoutItem>, opts: Opts },
    Inline { items: Vec<LayoutItem>, opts: Opts },
    Group { title: String, items: Vec<LayoutItem>, opts: Opts },
    Sections { items: Vec<LayoutItem>, opts: Opts },
    Section {
        label: String,
        active: Option<bool>,
        items: Vec<LayoutItem>,
        opts: Opts,
    },
}

impl LayoutItem {
    pub fn field(name: &str) -> Self {
        LayoutItem::Field {
            name: name.to_string(),
            opts: Opts::new(),
        }
    }

    pub fn stacked(items: Vec<LayoutItem>) -> Self {
        LayoutItem::Stacked { items, opts: Opts::new() }
    }

    pub fn inline(items: Vec<LayoutItem>) -> Self {
        LayoutItem::Inline { items, opts: Opts::new() }
    }

    pub fn group(title: &str, items: Vec<LayoutItem>) -> Self {
        LayoutItem::Group {
            title: title.to_string(),
            items,
            opts: Opts::new(),
        }
    }

    pub fn sections(items: Vec<LayoutItem>) -> Self {
        LayoutItem::Sections { items, opts: Opts::new() }
    }

    pub fn section(label: &str, items: Vec<LayoutItem>) -> Self {
        LayoutItem::Section {
            label: label.to_string(),
            active: None,
            items,
            opts: Opts::new(),
        }
    }

    /// Mark a section active (or not) explicitly. No-op on other items.
    pub fn active(mut self, value: bool) -> Self {
        if let LayoutItem::Section { active, .. } = &mut self {
            *active = Some(value);
        }
        self
    }

    pub fn with_opt(mut self, key: &str, value: Value) -> Self {
        let opts = match &mut self {
            LayoutItem::Field { opts, .. }
            | LayoutItem::Stacked { opts, .. }
            | LayoutItem::Inline { opts, .. }
            | LayoutItem::Group { opts, .. }
            | LayoutItem::Sections { opts, .. }
            | LayoutItem::Section { opts, .. } => opts,
        };
        opts.insert(key.to_string(), value);
        self
    }
}

/// Index view: columns plus list options (`order_by`, `where`, ...).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct IndexLayoutConfig {
    pub columns: Vec<LayoutItem>,
    #[serde(default)]
    pub opts: Opts,
}

/// Layout declarations for one resource. Missing views get a default layout.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LayoutConfig {
    pub resource: String,
    #[serde(default)]
    pub index: Option<IndexLayoutConfig>,
    #[serde(default)]
    pub show: Option<Vec<LayoutItem>>,
    #[serde(default)]
    pub form: Option<Vec<LayoutItem>>,
}

impl LayoutConfig {
    pub fn new(resource: &str) -> Self {
        LayoutConfig {
            resource: resource.to_string(),
            ..Default::default()
        }
    }

    pub fn index<I: IntoIterator<Item = LayoutItem>>(mut self, columns: I, opts: Opts) -> Self {
        self.index = Some(IndexLayoutConfig {
            columns: columns.into_iter().collect(),
            opts,
        });
        self
    }

    pub fn show(mut self, items: Vec<LayoutItem>) -> Self {
        self.show = Some(items);
        self
    }

    pub fn form(mut self, items: Vec<LayoutItem>) -> Self {
        self.form = Some(items);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Name(String),
    Tagged(RawTagged),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawTagged {
    Field(RawField),
    Stacked(RawContainer),
    Inline(RawContainer),
    Group(RawGroup),
    Sections(RawContainer),
    Section(RawSection),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        opts: Opts,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContainer {
    Items(Vec<LayoutItem>),
    Full {
        items: Vec<LayoutItem>,
        #[serde(default)]
        opts: Opts,
    },
}

impl RawContainer {
    fn split(self) -> (Vec<LayoutItem>, Opts) {
        match self {
            RawContainer::Items(items) => (items, Opts::new()),
            RawContainer::Full { items, opts } => (items, opts),
        }
    }
}

#[derive(Deserialize)]
struct RawGroup {
    title: String,
    items: Vec<LayoutItem>,
    #[serde(default)]
    opts: Opts,
}

#[derive(Deserialize)]
struct RawSection {
    label: String,
    #[serde(default)]
    active: Option<bool>,
    items: Vec<LayoutItem>,
    #[serde(default)]
    opts: Opts,
}

impl From<RawItem> for LayoutItem {
    fn from(raw: RawItem) -> Self {
        match raw {
            RawItem::Name(name) => LayoutItem::Field { name, opts: Opts::new() },
            RawItem::Tagged(tagged) => match tagged {
                RawTagged::Field(RawField::Name(name)) => LayoutItem::Field { name, opts: Opts::new() },
                RawTagged::Field(RawField::Full { name, opts }) => LayoutItem::Field { name, opts },
                RawTagged::Stacked(c) => {
                    let (items, opts) = c.split();
                    LayoutItem::Stacked { items, opts }
                }
                RawTagged::Inline(c) => {
                    let (items, opts) = c.split();
                    LayoutItem::Inline { items, opts }
                }
                RawTagged::Sections(c) => {
                    let (items, opts) = c.split();
                    LayoutItem::Sections { items, opts }
                }
                RawTagged::Group(g) => LayoutItem::Group {
                    title: g.title,
                    items: g.items,
                    opts: g.opts,
                },
                RawTagged::Section(s) => LayoutItem::Section {
                    label: s.label,
                    active: s.active,
                    items: s.items,
                    opts: s.opts,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_declaration_parses() {
        let items: Vec<LayoutItem> = serde_json::from_value(json!([
            "reference",
            {"inline": ["name", "quantity"]},
            {"group": {"title": "Prices", "items": ["cost", {"field": {"name": "msrp", "opts": {"readonly": true}}}]}},
            {"sections": [
                {"section": {"label": "Details", "items": ["description"]}},
                {"section": {"label": "Stock", "active": true, "items": [{"stacked": {"items": ["stock"], "opts": {"x": 1}}}]}}
            ]}
        ]))
        .unwrap();

        let expected = vec![
            LayoutItem::field("reference"),
            LayoutItem::inline(vec![LayoutItem::field("name"), LayoutItem::field("quantity")]),
            LayoutItem::group(
                "Prices",
                vec![LayoutItem::field("cost"), LayoutItem::field("msrp").with_opt("readonly", json!(true))],
            ),
            LayoutItem::sections(vec![
                LayoutItem::section("Details", vec![LayoutItem::field("description")]),
                LayoutItem::section(
                    "Stock",
                    vec![LayoutItem::stacked(vec![LayoutItem::field("stock")]).with_opt("x", json!(1))],
                )
                .active(true),
            ]),
        ];
        assert_eq!(items, expected);
    }

    #[test]
    fn layout_config_from_json() {
        let layout: LayoutConfig = serde_json::from_value(json!({
            "resource": "product",
            "index": {"columns": ["reference", "name"], "opts": {"order_by": "name"}}
        }))
        .unwrap();
        let index = layout.index.unwrap();
        assert_eq!(index.columns.len(), 2);
        assert_eq!(index.opts.get("order_by"), Some(&json!("name")));
        assert!(layout.form.is_none());
    }
}
