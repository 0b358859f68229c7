//! Compiled layout trees: the per-resource, per-view structure a renderer walks.

mod compiler;

pub use compiler::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Index,
    Show,
    Form,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Index, ViewKind::Show, ViewKind::Form];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Index => "index",
            ViewKind::Show => "show",
            ViewKind::Form => "form",
        }
    }

    pub fn tag(self) -> LayoutTag {
        match self {
            ViewKind::Index => LayoutTag::Index,
            ViewKind::Show => LayoutTag::Show,
            ViewKind::Form => LayoutTag::Form,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTag {
    Index,
    Show,
    Form,
    Field,
    Stacked,
    Inline,
    Group,
    Sections,
    Section,
}

/// Tag-specific node data.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    #[default]
    None,
    View {
        resource: String,
    },
    Field {
        /// Resource the field links to (association target or embedded resource).
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
    },
    Group {
        title: String,
    },
    Sections {
        sections_id: String,
    },
    Section {
        label: String,
        tab_index: usize,
        tab_id: String,
        sections_id: String,
        active: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutNode {
    pub tag: LayoutTag,
    pub name: String,
    pub config: NodeConfig,
    /// Effective options: declared on this node or inherited from the nearest ancestor.
    pub opts: Map<String, Value>,
    pub inner_elements: Vec<LayoutNode>,
}

impl LayoutNode {
    /// Field names under this node, depth-first.
    pub fn field_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.tag == LayoutTag::Field {
            out.push(&self.name);
        }
        for child in &self.inner_elements {
            child.collect_fields(out);
        }
    }

    /// First node (depth-first, self included) with this tag and name.
    pub fn find(&self, tag: LayoutTag, name: &str) -> Option<&LayoutNode> {
        if self.tag == tag && self.name == name {
            return Some(self);
        }
        self.inner_elements.iter().find_map(|c| c.find(tag, name))
    }

    pub fn find_field(&self, name: &str) -> Option<&LayoutNode> {
        self.find(LayoutTag::Field, name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutTree {
    pub resource: String,
    pub view: ViewKind,
    pub root: LayoutNode,
}

impl LayoutTree {
    pub fn field_names(&self) -> Vec<&str> {
        self.root.field_names()
    }
}
