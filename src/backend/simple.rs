//! Simple-schema adapter: schemas with fields and associations, plus context modules whose
//! CRUD functions are discovered by naming convention (`list_products`, `get_product`, ...).

use crate::backend::{
    ActionKind, ActionMeta, ActionTarget, AttributeMeta, BackendAdapter, BackendKind, ContextRef,
    Pagination, RelationshipMeta, SchemaRef,
};
use crate::case::to_snake_case;
use crate::operation::LogicalOp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PAGINATED_SUFFIX: &str = "_paginated";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub schemas: Vec<SchemaDef>,
    #[serde(default)]
    pub contexts: Vec<ContextDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: SchemaRef,
    /// Singular noun used by function names; defaults to the snake_cased last path segment.
    #[serde(default)]
    pub singular: Option<String>,
    /// Plural noun (table source) used by list functions; defaults to singular + "s".
    #[serde(default)]
    pub plural: Option<String>,
    pub fields: Vec<AttributeMeta>,
    #[serde(default)]
    pub associations: Vec<RelationshipMeta>,
}

impl SchemaDef {
    pub fn singular(&self) -> String {
        match &self.singular {
            Some(s) => s.clone(),
            None => {
                let last = self.name.as_str().rsplit('.').next().unwrap_or_default();
                to_snake_case(last)
            }
        }
    }

    pub fn plural(&self) -> String {
        self.plural
            .clone()
            .unwrap_or_else(|| format!("{}s", self.singular()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextDef {
    pub name: ContextRef,
    pub functions: Vec<FunctionDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub arity: u8,
    /// Target schema; inferred from the function name when absent.
    #[serde(default)]
    pub schema: Option<SchemaRef>,
    /// Action kind; inferred from the name prefix when absent.
    #[serde(default)]
    pub kind: Option<ActionKind>,
}

#[derive(Debug)]
pub struct SimpleSchemaAdapter {
    catalog: SchemaCatalog,
    schema_index: HashMap<SchemaRef, usize>,
}

impl SimpleSchemaAdapter {
    pub fn new(catalog: SchemaCatalog) -> Self {
        let schema_index = catalog
            .schemas
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        SimpleSchemaAdapter {
            catalog,
            schema_index,
        }
    }

    fn schema(&self, schema: &SchemaRef) -> Option<&SchemaDef> {
        self.schema_index
            .get(schema)
            .map(|i| &self.catalog.schemas[*i])
    }

    /// Schema a function operates on: explicit, or matched from the noun in its name.
    fn function_schema(&self, function: &FunctionDef) -> Option<SchemaRef> {
        if let Some(schema) = &function.schema {
            return Some(schema.clone());
        }
        let (_, noun) = function.name.split_once('_')?;
        let noun = noun.strip_suffix(PAGINATED_SUFFIX).unwrap_or(noun);
        self.catalog
            .schemas
            .iter()
            .find(|s| s.plural() == noun || s.singular() == noun)
            .map(|s| s.name.clone())
    }

    fn contexts<'a>(&'a self, context: Option<&'a ContextRef>) -> impl Iterator<Item = &'a ContextDef> {
        self.catalog
            .contexts
            .iter()
            .filter(move |c| context.map_or(true, |wanted| &c.name == wanted))
    }
}

/// Explicit kind, else the one implied by the function-name prefix.
fn function_kind(function: &FunctionDef) -> Option<ActionKind> {
    if function.kind.is_some() {
        return function.kind;
    }
    let prefix = function.name.split('_').next()?;
    match prefix {
        "list" | "get" => Some(ActionKind::Read),
        "create" => Some(ActionKind::Create),
        "update" | "change" => Some(ActionKind::Update),
        "delete" => Some(ActionKind::Destroy),
        _ => None,
    }
}

impl BackendAdapter for SimpleSchemaAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::SimpleSchema
    }

    fn has_schema(&self, schema: &SchemaRef) -> bool {
        self.schema_index.contains_key(schema)
    }

    fn list_attributes(&self, schema: &SchemaRef) -> Vec<AttributeMeta> {
        self.schema(schema)
            .map(|s| s.fields.clone())
            .unwrap_or_default()
    }

    fn list_relationships(&self, schema: &SchemaRef) -> Vec<RelationshipMeta> {
        self.schema(schema)
            .map(|s| s.associations.clone())
            .unwrap_or_default()
    }

    fn list_actions(
        &self,
        schema: &SchemaRef,
        context: Option<&ContextRef>,
        kind: ActionKind,
    ) -> Vec<ActionMeta> {
        let mut actions = Vec::new();
        for ctx in self.contexts(context) {
            for function in &ctx.functions {
                if function_kind(function) != Some(kind) {
                    continue;
                }
                if self.function_schema(function).as_ref() != Some(schema) {
                    continue;
                }
                actions.push(ActionMeta {
                    name: function.name.clone(),
                    kind,
                    primary: false,
                    pagination: Pagination::Enabled(function.name.ends_with(PAGINATED_SUFFIX)),
                    arity: Some(function.arity),
                });
            }
        }
        actions
    }

    fn resolve_action_target(&self, context: &ContextRef, name: &str) -> Option<ActionTarget> {
        let function = self
            .contexts(Some(context))
            .flat_map(|c| c.functions.iter())
            .find(|f| f.name == name)?;
        Some(ActionTarget {
            schema: self.function_schema(function),
            action: function.name.clone(),
            arity: Some(function.arity),
        })
    }

    fn explicit_action(&self, context: &ContextRef, name: &str, kind: ActionKind) -> Option<ActionMeta> {
        let function = self
            .contexts(Some(context))
            .flat_map(|c| c.functions.iter())
            .find(|f| f.name == name)?;
        if function.kind.is_some_and(|declared| declared != kind) {
            return None;
        }
        Some(ActionMeta {
            name: function.name.clone(),
            kind,
            primary: false,
            pagination: Pagination::Enabled(function.name.ends_with(PAGINATED_SUFFIX)),
            arity: Some(function.arity),
        })
    }

    fn conventional_action(&self, schema: &SchemaRef, op: LogicalOp) -> Option<String> {
        let def = self.schema(schema)?;
        let singular = def.singular();
        let plural = def.plural();
        Some(match op {
            LogicalOp::List => format!("list_{}", plural),
            LogicalOp::ListPaginated => format!("list_{}{}", plural, PAGINATED_SUFFIX),
            LogicalOp::Get => format!("get_{}", singular),
            LogicalOp::Create => format!("create_{}", singular),
            LogicalOp::Update => format!("update_{}", singular),
            LogicalOp::Delete => format!("delete_{}", singular),
            LogicalOp::Change => format!("change_{}", singular),
            LogicalOp::New => return None,
        })
    }
}
