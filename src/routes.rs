//! Route manifest: which of the five CRUD routes a resource exposes, from `only` / `except`.

use crate::operation::LogicalOp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    Index,
    New,
    Edit,
    Show,
    Delete,
}

impl RouteAction {
    pub const ALL: [RouteAction; 5] = [
        RouteAction::Index,
        RouteAction::New,
        RouteAction::Edit,
        RouteAction::Show,
        RouteAction::Delete,
    ];

    /// Operations the route needs. `list_paginated` is added separately for paginated indexes.
    pub fn operations(self) -> &'static [LogicalOp] {
        match self {
            RouteAction::Index => &[LogicalOp::List],
            RouteAction::Show => &[LogicalOp::Get],
            RouteAction::New => &[LogicalOp::New, LogicalOp::Change, LogicalOp::Create],
            RouteAction::Edit => &[LogicalOp::Get, LogicalOp::Change, LogicalOp::Update],
            RouteAction::Delete => &[LogicalOp::Delete],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RoutesConfig {
    #[serde(default)]
    pub only: Option<Vec<RouteAction>>,
    #[serde(default)]
    pub except: Vec<RouteAction>,
}

impl RoutesConfig {
    pub fn only<I: IntoIterator<Item = RouteAction>>(routes: I) -> Self {
        RoutesConfig {
            only: Some(routes.into_iter().collect()),
            except: Vec::new(),
        }
    }

    pub fn except<I: IntoIterator<Item = RouteAction>>(routes: I) -> Self {
        RoutesConfig {
            only: None,
            except: routes.into_iter().collect(),
        }
    }

    /// Enabled routes in canonical order. `except` applies after `only`.
    pub fn manifest(&self) -> Vec<RouteAction> {
        RouteAction::ALL
            .into_iter()
            .filter(|r| self.only.as_ref().map_or(true, |only| only.contains(r)))
            .filter(|r| !self.except.contains(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use RouteAction::*;

    #[rstest]
    #[case(RoutesConfig::default(), vec![Index, New, Edit, Show, Delete])]
    #[case(RoutesConfig::only([Show, Index]), vec![Index, Show])]
    #[case(RoutesConfig::except([Delete, New]), vec![Index, Edit, Show])]
    #[case(RoutesConfig { only: Some(vec![Index, Show]), except: vec![Show] }, vec![Index])]
    #[case(RoutesConfig::only(Vec::<RouteAction>::new()), vec![])]
    fn manifest_applies_only_then_except(#[case] config: RoutesConfig, #[case] expected: Vec<RouteAction>) {
        assert_eq!(config.manifest(), expected);
    }

    #[test]
    fn parses_route_names() {
        let config: RoutesConfig = serde_json::from_value(json!({"except": ["delete"]})).unwrap();
        assert_eq!(config.manifest(), vec![Index, New, Edit, Show]);
        assert!(serde_json::from_value::<RoutesConfig>(json!({"only": ["archive"]})).is_err());
    }
}
