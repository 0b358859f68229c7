//! Backend adapter interface: the capability set the core asks of a data backend.
//! Two adapters implement it; one is selected per resource when it is registered.

mod declarative;
mod meta;
mod simple;

pub use declarative::*;
pub use meta::*;
pub use simple::*;

use crate::operation::LogicalOp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    SimpleSchema,
    DeclarativeAction,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::SimpleSchema => "simple-schema",
            BackendKind::DeclarativeAction => "declarative-action",
        }
    }
}

pub trait BackendAdapter: fmt::Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    fn has_schema(&self, schema: &SchemaRef) -> bool;

    /// Plain attributes in declaration order.
    fn list_attributes(&self, schema: &SchemaRef) -> Vec<AttributeMeta>;

    /// Relationships and embeds in declaration order.
    fn list_relationships(&self, schema: &SchemaRef) -> Vec<RelationshipMeta>;

    /// Actions of `kind` on `schema`, in declaration order. With a context, only the
    /// actions that context exposes.
    fn list_actions(
        &self,
        schema: &SchemaRef,
        context: Option<&ContextRef>,
        kind: ActionKind,
    ) -> Vec<ActionMeta>;

    /// Resolve a name exposed by a context/domain to the schema and action it calls.
    fn resolve_action_target(&self, context: &ContextRef, name: &str) -> Option<ActionTarget>;

    /// Action name implied by the backend's naming convention, if it has one.
    fn conventional_action(&self, _schema: &SchemaRef, _op: LogicalOp) -> Option<String> {
        None
    }

    /// A context function the user named explicitly for an operation of `kind`, when the
    /// backend cannot discover it on its own. Backends with typed actions return `None`.
    fn explicit_action(&self, _context: &ContextRef, _name: &str, _kind: ActionKind) -> Option<ActionMeta> {
        None
    }
}

/// The adapters available to a compilation.
#[derive(Clone, Debug, Default)]
pub struct Backends {
    simple: Option<Arc<dyn BackendAdapter>>,
    declarative: Option<Arc<dyn BackendAdapter>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simple(mut self, adapter: SimpleSchemaAdapter) -> Self {
        self.simple = Some(Arc::new(adapter));
        self
    }

    pub fn with_declarative(mut self, adapter: DeclarativeActionAdapter) -> Self {
        self.declarative = Some(Arc::new(adapter));
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendAdapter>> {
        match kind {
            BackendKind::SimpleSchema => self.simple.clone(),
            BackendKind::DeclarativeAction => self.declarative.clone(),
        }
    }
}
