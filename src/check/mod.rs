//! Rule engine for task flow graphs.
//!
//! Every rule inspects one node against the full node list and reports
//! [`CheckItem`]s. Rules never fail: a malformed metadata list becomes an
//! ERROR finding for that node and the remaining rules still run.

mod rules;

use serde::{Deserialize, Serialize};

use crate::{CheckConfig, model::TaskNodeModel};

pub use rules::*;

/// Severity of a finding. Ordered so that the maximum is the worst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::AsRefStr, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckLevel {
    #[default]
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    pub level: CheckLevel,
    pub title: String,
    pub message: String,
    /// Node ids implicated in the finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_ids: Option<Vec<String>>,
}

impl CheckItem {
    pub fn new(
        level: CheckLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            related_ids: None,
        }
    }

    pub fn error(
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(CheckLevel::Error, title, message)
    }

    pub fn warn(
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(CheckLevel::Warn, title, message)
    }

    pub fn related<I, S>(
        mut self,
        ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// All findings of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCheckResult {
    pub list: Vec<CheckItem>,
}

impl NodeCheckResult {
    /// Worst severity among the findings, `Success` when there are none.
    pub fn level(&self) -> CheckLevel {
        self.list.iter().map(|item| item.level).max().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// A single validation rule.
pub trait CheckRule: Send + Sync {
    fn name(&self) -> &str;

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Meta `type` of nodes that must carry a `taskType`.
    pub condition_task_type: String,
    /// `timeType` values whose times are day offsets and skip the range check.
    pub day_time_types: Vec<i64>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckConfig::default().into()
    }
}

impl From<CheckConfig> for CheckOptions {
    fn from(config: CheckConfig) -> Self {
        Self {
            condition_task_type: config.condition_task_type,
            day_time_types: config.day_time_types,
        }
    }
}

/// Runs an ordered list of rules over every node.
pub struct Checker {
    rules: Vec<Box<dyn CheckRule>>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(CheckOptions::default())
    }
}

impl Checker {
    /// Checker populated with the built-in rules.
    pub fn new(options: CheckOptions) -> Self {
        Self {
            rules: built_in_rules(&options),
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn CheckRule>>) -> Self {
        Self {
            rules,
        }
    }

    pub fn push(
        &mut self,
        rule: Box<dyn CheckRule>,
    ) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn check_node(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> NodeCheckResult {
        let mut list = Vec::new();
        for rule in &self.rules {
            list.extend(rule.apply(node, all_nodes));
        }
        NodeCheckResult {
            list,
        }
    }

    pub fn check_all(
        &self,
        nodes: &[TaskNodeModel],
    ) -> CheckReport {
        let entries = nodes
            .iter()
            .map(|node| NodeReport {
                node_id: node.id.clone(),
                result: self.check_node(node, nodes),
            })
            .collect();
        CheckReport {
            entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub node_id: String,
    pub result: NodeCheckResult,
}

/// Results of a validation pass, in node order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    entries: Vec<NodeReport>,
}

impl CheckReport {
    pub fn entries(&self) -> &[NodeReport] {
        &self.entries
    }

    pub fn get(
        &self,
        node_id: &str,
    ) -> Option<&NodeCheckResult> {
        self.entries.iter().find(|e| e.node_id == node_id).map(|e| &e.result)
    }

    /// Worst severity across the whole flow.
    pub fn level(&self) -> CheckLevel {
        self.entries.iter().map(|e| e.result.level()).max().unwrap_or_default()
    }

    /// Number of findings with the given severity.
    pub fn count(
        &self,
        level: CheckLevel,
    ) -> usize {
        self.entries.iter().flat_map(|e| e.result.list.iter()).filter(|item| item.level == level).count()
    }

    pub fn errors(&self) -> usize {
        self.count(CheckLevel::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckLevel::Warn)
    }

    /// Ids to highlight when the node is inspected, without duplicates.
    pub fn related_ids(
        &self,
        node_id: &str,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        if let Some(result) = self.get(node_id) {
            for id in result.list.iter().filter_map(|item| item.related_ids.as_ref()).flatten() {
                if !out.contains(id) {
                    out.push(id.clone());
                }
            }
        }
        out
    }
}
