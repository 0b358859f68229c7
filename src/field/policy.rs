//! Naming policy: which field keys are disabled, hidden or omitted by convention.

use crate::config::NamingPolicyConfig;
use crate::error::ConfigError;
use regex::Regex;

#[derive(Clone, Debug, Default)]
pub struct NamingPolicy {
    disabled: Vec<Regex>,
    hidden: Vec<Regex>,
    omitted: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPolicy {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl NamingPolicy {
    pub fn from_config(config: &NamingPolicyConfig) -> Result<Self, ConfigError> {
        Ok(NamingPolicy {
            disabled: compile(&config.disabled)?,
            hidden: compile(&config.hidden)?,
            omitted: compile(&config.omitted)?,
        })
    }

    pub fn is_disabled(&self, key: &str) -> bool {
        self.disabled.iter().any(|r| r.is_match(key))
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.iter().any(|r| r.is_match(key))
    }

    pub fn is_omitted(&self, key: &str) -> bool {
        self.omitted.iter().any(|r| r.is_match(key))
    }
}
