//! auix: compile declarative resource metadata into field descriptors, operation references,
//! layout trees and route manifests for an admin UI.

pub mod app;
pub mod association;
pub mod backend;
pub mod case;
pub mod config;
pub mod error;
pub mod field;
pub mod layout;
pub mod operation;
pub mod query;
pub mod registry;
pub mod routes;
pub mod sql;

pub use app::{compile, AppSchema};
pub use backend::{BackendAdapter, BackendKind, Backends, DeclarativeActionAdapter, SimpleSchemaAdapter};
pub use config::{load_from_dir, AppConfig, LayoutConfig, LayoutItem, ResourceConfig};
pub use error::ConfigError;
pub use field::{Field, FieldType, HtmlType};
pub use layout::{LayoutNode, LayoutTag, LayoutTree, ViewKind};
pub use operation::{LogicalOp, OperationReference};
pub use query::{translate, translate_for, QueryOpts, QueryTarget};
pub use registry::{Resource, ResourceRegistry};
pub use routes::{RouteAction, RoutesConfig};
