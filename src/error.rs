//! Typed errors. Everything here is a configuration defect detected while compiling the app schema.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("resource '{resource}': no {kind} backend configured")]
    UnsupportedBackend { resource: String, kind: &'static str },
    #[error("resource '{resource}': no {action_kind} action found (searched for {action})")]
    MissingOperation {
        resource: String,
        action_kind: &'static str,
        action: String,
    },
    #[error("resource '{resource}': invalid `new` initializer: {reason}")]
    InvalidInitializer { resource: String, reason: String },
    #[error("layout for '{resource}' references unknown field '{field}'")]
    UnknownField { resource: String, field: String },
    #[error("layout for '{resource}' references omitted field '{field}'")]
    OmittedField { resource: String, field: String },
    #[error("malformed layout for '{resource}': {reason}")]
    MalformedLayout { resource: String, reason: String },
    #[error("embed cycle detected: {}", .chain.join(" -> "))]
    EmbedCycle { chain: Vec<String> },
    #[error("invalid naming policy pattern '{pattern}': {reason}")]
    InvalidPolicy { pattern: String, reason: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Load(e.to_string())
    }
}
