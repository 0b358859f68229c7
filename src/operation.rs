//! CRUD operation resolver: logical operation -> opaque reference to a backend action or initializer.
//!
//! Selection policy: an explicit user name restricts the candidates to that name; otherwise the
//! backend's naming convention (if any) does; `list_paginated` keeps paginated actions only; the
//! primary candidate wins, else the first declared. No candidate is a fatal config error.

use crate::backend::{ActionKind, ActionMeta, BackendAdapter, BackendKind, ContextRef, SchemaRef};
use crate::case::to_snake_case;
use crate::config::ResourceConfig;
use crate::error::ConfigError;
use crate::routes::RouteAction;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    List,
    ListPaginated,
    Get,
    Create,
    Update,
    Delete,
    Change,
    New,
}

impl LogicalOp {
    pub const ALL: [LogicalOp; 8] = [
        LogicalOp::List,
        LogicalOp::ListPaginated,
        LogicalOp::Get,
        LogicalOp::Create,
        LogicalOp::Update,
        LogicalOp::Delete,
        LogicalOp::Change,
        LogicalOp::New,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::List => "list",
            LogicalOp::ListPaginated => "list_paginated",
            LogicalOp::Get => "get",
            LogicalOp::Create => "create",
            LogicalOp::Update => "update",
            LogicalOp::Delete => "delete",
            LogicalOp::Change => "change",
            LogicalOp::New => "new",
        }
    }

    /// Backend action kind; `None` for `new`, which is an initializer.
    pub fn action_kind(self) -> Option<ActionKind> {
        match self {
            LogicalOp::List | LogicalOp::ListPaginated | LogicalOp::Get => Some(ActionKind::Read),
            LogicalOp::Create => Some(ActionKind::Create),
            LogicalOp::Update | LogicalOp::Change => Some(ActionKind::Update),
            LogicalOp::Delete => Some(ActionKind::Destroy),
            LogicalOp::New => None,
        }
    }

    /// Override keys accepted for this op, generic name first.
    fn override_keys(self) -> &'static [&'static str] {
        match self {
            LogicalOp::List => &["list", "list_function", "list_action"],
            LogicalOp::ListPaginated => &["list_paginated", "list_function_paginated", "list_paginated_action"],
            LogicalOp::Get => &["get", "get_function", "get_action"],
            LogicalOp::Create => &["create", "create_function", "create_action"],
            LogicalOp::Update => &["update", "update_function", "update_action"],
            LogicalOp::Delete => &["delete", "delete_function", "delete_action", "destroy_action"],
            LogicalOp::Change => &["change", "change_function", "change_action"],
            LogicalOp::New => &["new", "new_function"],
        }
    }

    /// Op an override key (snake_case or camelCase) refers to.
    pub fn from_override_key(key: &str) -> Option<Self> {
        let key = to_snake_case(key);
        Self::ALL
            .into_iter()
            .find(|op| op.override_keys().contains(&key.as_str()))
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type InitFn = dyn Fn(&Map<String, Value>, &Map<String, Value>) -> Value + Send + Sync;

/// User-supplied `new` initializer: `(attrs, opts) -> entity`.
#[derive(Clone)]
pub struct InitializerFn(pub Arc<InitFn>);

impl InitializerFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Map<String, Value>, &Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        InitializerFn(Arc::new(f))
    }
}

impl fmt::Debug for InitializerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InitializerFn(..)")
    }
}

#[derive(Clone, Debug)]
pub enum Initializer {
    /// Blank entity: every attribute at its default (or null), overlaid with the given attrs.
    Blank { defaults: Map<String, Value> },
    /// Backend function `name/2`, called by the execution layer.
    Function { context: ContextRef, name: String },
    Custom(InitializerFn),
}

impl Initializer {
    /// Build an entity in-process. `None` for backend functions.
    pub fn build(&self, attrs: &Map<String, Value>, opts: &Map<String, Value>) -> Option<Value> {
        match self {
            Initializer::Blank { defaults } => {
                let mut entity = defaults.clone();
                for (k, v) in attrs {
                    entity.insert(k.clone(), v.clone());
                }
                Some(Value::Object(entity))
            }
            Initializer::Function { .. } => None,
            Initializer::Custom(f) => Some((f.0)(attrs, opts)),
        }
    }
}

impl Serialize for Initializer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Initializer::Blank { .. } => serializer.serialize_str("blank"),
            Initializer::Function { name, .. } => serializer.serialize_str(name),
            Initializer::Custom(_) => serializer.serialize_str("fn/2"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationTarget {
    Action(ActionMeta),
    Initializer(Initializer),
}

/// Opaque handle carrying what the execution layer needs to perform the call later.
#[derive(Clone, Debug, Serialize)]
pub struct OperationReference {
    pub op: LogicalOp,
    pub resource: String,
    pub backend: BackendKind,
    pub schema: SchemaRef,
    pub context: Option<ContextRef>,
    pub target: OperationTarget,
}

impl OperationReference {
    pub fn action(&self) -> Option<&ActionMeta> {
        match &self.target {
            OperationTarget::Action(a) => Some(a),
            OperationTarget::Initializer(_) => None,
        }
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        match &self.target {
            OperationTarget::Initializer(i) => Some(i),
            OperationTarget::Action(_) => None,
        }
    }
}

/// Where an operation is looked up.
#[derive(Clone, Copy, Debug)]
pub struct OperationScope<'a> {
    pub resource: &'a str,
    pub schema: &'a SchemaRef,
    pub context: Option<&'a ContextRef>,
}

/// User overrides for one resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationOverrides<'a> {
    names: Option<&'a HashMap<String, Option<String>>>,
    initializer: Option<&'a InitializerFn>,
}

impl<'a> OperationOverrides<'a> {
    pub fn from_config(config: &'a ResourceConfig) -> Self {
        OperationOverrides {
            names: Some(&config.operations),
            initializer: config.new_initializer.as_ref(),
        }
    }

    /// `Some(None)` when the override is present but null.
    pub fn name_for(&self, op: LogicalOp) -> Option<Option<&'a str>> {
        let names = self.names?;
        op.override_keys().iter().find_map(|wanted| {
            names
                .iter()
                .find(|(key, _)| to_snake_case(key) == *wanted)
                .map(|(_, name)| name.as_deref())
        })
    }

    pub fn overridden_ops(&self) -> BTreeSet<LogicalOp> {
        let mut ops: BTreeSet<LogicalOp> = self
            .names
            .map(|names| names.keys().filter_map(|k| LogicalOp::from_override_key(k)).collect())
            .unwrap_or_default();
        if self.initializer.is_some() {
            ops.insert(LogicalOp::New);
        }
        ops
    }
}

/// Ops a resource needs for its enabled routes, plus every op the user overrides.
pub fn required_ops(routes: &[RouteAction], paginated: bool, overrides: &OperationOverrides<'_>) -> BTreeSet<LogicalOp> {
    let mut ops = overrides.overridden_ops();
    for route in routes {
        ops.extend(route.operations().iter().copied());
        if *route == RouteAction::Index && paginated {
            ops.insert(LogicalOp::ListPaginated);
        }
    }
    ops
}

pub fn resolve_operation(
    adapter: &dyn BackendAdapter,
    scope: &OperationScope<'_>,
    op: LogicalOp,
    overrides: &OperationOverrides<'_>,
) -> Result<OperationReference, ConfigError> {
    let target = match op.action_kind() {
        Some(kind) => OperationTarget::Action(resolve_action(adapter, scope, op, kind, overrides)?),
        None => OperationTarget::Initializer(resolve_initializer(adapter, scope, overrides)?),
    };
    tracing::debug!(resource = scope.resource, op = %op, target = ?target, "resolved operation");
    Ok(OperationReference {
        op,
        resource: scope.resource.to_string(),
        backend: adapter.kind(),
        schema: scope.schema.clone(),
        context: scope.context.cloned(),
        target,
    })
}

fn resolve_action(
    adapter: &dyn BackendAdapter,
    scope: &OperationScope<'_>,
    op: LogicalOp,
    kind: ActionKind,
    overrides: &OperationOverrides<'_>,
) -> Result<ActionMeta, ConfigError> {
    let explicit = overrides.name_for(op).flatten();
    let (wanted, mut candidates) = match explicit {
        Some(name) => {
            // A context-exposed name points at the action it wraps.
            let target = scope
                .context
                .and_then(|c| adapter.resolve_action_target(c, name));
            let candidates = match target.as_ref().and_then(|t| t.schema.as_ref()) {
                Some(schema) => adapter.list_actions(schema, None, kind),
                None => adapter.list_actions(scope.schema, scope.context, kind),
            };
            let action = target.map_or_else(|| name.to_string(), |t| t.action);
            (Some(action), candidates)
        }
        None => (
            adapter.conventional_action(scope.schema, op),
            adapter.list_actions(scope.schema, scope.context, kind),
        ),
    };

    if let Some(name) = &wanted {
        candidates.retain(|a| &a.name == name);
    }
    if candidates.is_empty() {
        let named = scope.context.zip(explicit);
        if let Some(action) = named.and_then(|(ctx, name)| adapter.explicit_action(ctx, name, kind)) {
            tracing::debug!(resource = scope.resource, op = %op, action = %action.name, "using explicitly named function");
            return Ok(if op == LogicalOp::ListPaginated { action.paginated() } else { action });
        }
    }
    if op == LogicalOp::ListPaginated {
        candidates.retain(|a| a.pagination.is_enabled());
    }

    let chosen = match candidates.iter().position(|a| a.primary) {
        Some(i) => candidates.swap_remove(i),
        None if !candidates.is_empty() => candidates.remove(0),
        None => {
            let searched = match wanted {
                Some(name) => name,
                None if op == LogicalOp::ListPaginated => format!("any paginated {} action", kind.as_str()),
                None => format!("any {} action", kind.as_str()),
            };
            return Err(ConfigError::MissingOperation {
                resource: scope.resource.to_string(),
                action_kind: kind.as_str(),
                action: searched,
            });
        }
    };
    Ok(chosen)
}

fn resolve_initializer(
    adapter: &dyn BackendAdapter,
    scope: &OperationScope<'_>,
    overrides: &OperationOverrides<'_>,
) -> Result<Initializer, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidInitializer {
        resource: scope.resource.to_string(),
        reason,
    };

    if let Some(f) = overrides.initializer {
        return Ok(Initializer::Custom(f.clone()));
    }
    match overrides.name_for(LogicalOp::New) {
        None => {
            let defaults = adapter
                .list_attributes(scope.schema)
                .into_iter()
                .map(|a| (a.name, a.default.unwrap_or(Value::Null)))
                .collect();
            Ok(Initializer::Blank { defaults })
        }
        Some(None) => Err(invalid("override is null".into())),
        Some(Some("")) => Err(invalid("override is empty".into())),
        Some(Some(name)) => {
            let context = scope
                .context
                .ok_or_else(|| invalid(format!("'{}' needs a context to resolve", name)))?;
            let target = adapter
                .resolve_action_target(context, name)
                .ok_or_else(|| invalid(format!("'{}' not found in {}", name, context)))?;
            match target.arity {
                Some(2) => Ok(Initializer::Function {
                    context: context.clone(),
                    name: name.to_string(),
                }),
                Some(n) => Err(invalid(format!("'{}' has arity {}, expected 2", name, n))),
                None => Err(invalid(format!("'{}' has unknown arity, expected 2", name))),
            }
        }
    }
}
