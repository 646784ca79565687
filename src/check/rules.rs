use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::{CheckItem, CheckOptions, CheckRule};
use crate::model::{Constraint, TaskNodeModel};

/// The built-in rules in display order.
pub fn built_in_rules(options: &CheckOptions) -> Vec<Box<dyn CheckRule>> {
    vec![
        Box::new(UniqueTaskIdRule),
        Box::new(ParentExistsRule),
        Box::new(SelfParentRule),
        Box::new(PromiseExistsRule),
        Box::new(TimeRangeRule {
            day_time_types: options.day_time_types.clone(),
        }),
        Box::new(TitlePresentRule),
        Box::new(ConditionTaskTypeRule {
            condition_task_type: options.condition_task_type.clone(),
        }),
        Box::new(RewardPairRule),
        Box::new(ParentCycleRule),
        Box::new(RequireChildTypesRule),
        Box::new(ExcludeChildTypesRule),
        Box::new(IncludeChildTypeRule),
        Box::new(ParentRequiredFieldsRule),
        Box::new(RequiredFieldsRule),
        Box::new(ChildRequiredFieldsRule),
        Box::new(SingleRootRule),
    ]
}

/// A constraint list declared in node metadata.
#[derive(Debug, Clone, PartialEq)]
enum Declared {
    /// Not declared, empty, or not an array: nothing to check.
    Absent,
    /// Present but not valid JSON.
    Malformed,
    List(Vec<String>),
}

fn declared(
    node: &TaskNodeModel,
    constraint: Constraint,
) -> Declared {
    let items = match node.data.meta.constraint(constraint) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Declared::Absent,
        Some(Value::String(s)) if s.is_empty() => return Declared::Absent,
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Declared::Absent,
            Err(_) => return Declared::Malformed,
        },
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(_)) => return Declared::Malformed,
        Some(_) => return Declared::Absent,
    };

    if items.is_empty() {
        return Declared::Absent;
    }
    Declared::List(items.iter().map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string())).collect())
}

fn malformed(constraint: Constraint) -> CheckItem {
    CheckItem::error(
        format!("{} is unreadable", constraint.as_ref()),
        format!("{} is not a valid JSON array string", constraint.as_ref()),
    )
}

/// Direct children by `parentTaskId`. A node without a task id has none.
fn children<'a>(
    node: &TaskNodeModel,
    all_nodes: &'a [TaskNodeModel],
) -> Vec<&'a TaskNodeModel> {
    if node.data.task_id.is_empty() {
        return Vec::new();
    }
    all_nodes.iter().filter(|n| n.data.parent_task_id == node.data.task_id).collect()
}

fn find_by_task_id<'a>(
    task_id: &str,
    all_nodes: &'a [TaskNodeModel],
) -> Option<&'a TaskNodeModel> {
    if task_id.is_empty() {
        return None;
    }
    all_nodes.iter().find(|n| n.data.task_id == task_id)
}

fn missing_fields(
    node: &TaskNodeModel,
    fields: &[String],
) -> Vec<String> {
    fields.iter().filter(|field| node.data.is_field_blank(field)).cloned().collect()
}

/// Integers at or above this are unix seconds (2000-01-01T00:00:00Z),
/// smaller ones are day offsets.
const MIN_UNIX_SECONDS: i64 = 946_684_800;

/// Parses the time values the editor produces: unix seconds and the usual
/// date formats. Small integers are day offsets and never parse.
fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        if n < MIN_UNIX_SECONDS {
            return None;
        }
        return DateTime::from_timestamp(n, 0).map(|dt| dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

struct UniqueTaskIdRule;

impl CheckRule for UniqueTaskIdRule {
    fn name(&self) -> &str {
        "task id must be unique"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let task_id = &node.data.task_id;
        if task_id.is_empty() {
            return Vec::new();
        }
        let same: Vec<&str> = all_nodes.iter().filter(|n| &n.data.task_id == task_id).map(|n| n.id.as_str()).collect();
        if same.len() > 1 {
            return vec![CheckItem::error("duplicate taskId", format!("taskId \"{}\" is used more than once", task_id)).related(same)];
        }
        Vec::new()
    }
}

struct ParentExistsRule;

impl CheckRule for ParentExistsRule {
    fn name(&self) -> &str {
        "parent task must exist"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let parent = &node.data.parent_task_id;
        if !parent.is_empty() && find_by_task_id(parent, all_nodes).is_none() {
            return vec![CheckItem::warn("parent task not found", format!("no node has taskId \"{}\"", parent)).related([node.id.clone()])];
        }
        Vec::new()
    }
}

struct SelfParentRule;

impl CheckRule for SelfParentRule {
    fn name(&self) -> &str {
        "node must not be its own parent"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if !node.data.task_id.is_empty() && node.data.parent_task_id == node.data.task_id {
            return vec![CheckItem::error("node is its own parent", "a node cannot reference itself as parent task").related([node.id.clone()])];
        }
        Vec::new()
    }
}

struct PromiseExistsRule;

impl CheckRule for PromiseExistsRule {
    fn name(&self) -> &str {
        "predecessor task must exist"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let promise = &node.data.promise_task_id;
        if !promise.is_empty() && find_by_task_id(promise, all_nodes).is_none() {
            return vec![
                CheckItem::warn("predecessor task not found", format!("no node has taskId \"{}\"", promise)).related([node.id.clone()]),
            ];
        }
        Vec::new()
    }
}

struct TimeRangeRule {
    day_time_types: Vec<i64>,
}

impl CheckRule for TimeRangeRule {
    fn name(&self) -> &str {
        "time range must be ordered"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if node.data.time_type.is_some_and(|t| self.day_time_types.contains(&t)) {
            return Vec::new();
        }
        let (start, end) = (&node.data.start_time, &node.data.end_time);
        match (parse_time(start), parse_time(end)) {
            (Some(s), Some(e)) if s > e => {
                vec![CheckItem::error("invalid time range", format!("start time is after end time: {} > {}", start, end)).related([node.id.clone()])]
            }
            _ => Vec::new(),
        }
    }
}

struct TitlePresentRule;

impl CheckRule for TitlePresentRule {
    fn name(&self) -> &str {
        "task title must be set"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if node.data.label.trim().is_empty() {
            return vec![CheckItem::warn("missing title", "task title must not be empty").related([node.id.clone()])];
        }
        Vec::new()
    }
}

struct ConditionTaskTypeRule {
    condition_task_type: String,
}

impl CheckRule for ConditionTaskTypeRule {
    fn name(&self) -> &str {
        "condition tasks need a task type"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let is_condition_task = node.data.meta.kind.as_deref() == Some(self.condition_task_type.as_str());
        if is_condition_task && node.data.task_type.is_empty() {
            return vec![CheckItem::warn("task type not set", "choose a taskType for this task").related([node.id.clone()])];
        }
        Vec::new()
    }
}

struct RewardPairRule;

impl CheckRule for RewardPairRule {
    fn name(&self) -> &str {
        "reward type needs a reward"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let data = &node.data;
        if !data.reward_type.is_empty() && data.reward.is_empty() {
            return vec![
                CheckItem::warn("missing reward", format!("reward type ({}) is selected but no reward is set", data.reward_type)).related([node.id.clone()]),
            ];
        }
        Vec::new()
    }
}

struct ParentCycleRule;

impl ParentCycleRule {
    /// Walks the parent chain starting at `task_id`. Any revisit counts as a
    /// cycle, including a loop the start node only leads into.
    fn has_cycle(
        task_id: &str,
        all_nodes: &[TaskNodeModel],
    ) -> bool {
        // first node with a task id wins, as in the hierarchy
        let mut by_task_id: HashMap<&str, &TaskNodeModel> = HashMap::with_capacity(all_nodes.len());
        for n in all_nodes {
            by_task_id.entry(n.data.task_id.as_str()).or_insert(n);
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = task_id;
        loop {
            if !visited.insert(current) {
                return true;
            }
            match by_task_id.get(current) {
                Some(node) if !node.data.parent_task_id.is_empty() => current = node.data.parent_task_id.as_str(),
                _ => return false,
            }
        }
    }
}

impl CheckRule for ParentCycleRule {
    fn name(&self) -> &str {
        "parent chain must not loop"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if !node.data.task_id.is_empty() && Self::has_cycle(&node.data.task_id, all_nodes) {
            return vec![CheckItem::error("task cycle detected", "parent task references form a loop").related([node.id.clone()])];
        }
        Vec::new()
    }
}

struct RequireChildTypesRule;

impl CheckRule for RequireChildTypesRule {
    fn name(&self) -> &str {
        "children must have a required type"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if node.data.task_id.is_empty() {
            return Vec::new();
        }
        let allowed = match declared(node, Constraint::Require) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::Require)],
            Declared::List(list) => list,
        };

        let invalid: Vec<&TaskNodeModel> = children(node, all_nodes).into_iter().filter(|c| !allowed.contains(&c.data.node_type)).collect();
        if invalid.is_empty() {
            return Vec::new();
        }
        vec![
            CheckItem::error(
                "child type not allowed",
                format!(
                    "expected types: [{}], found: {}",
                    allowed.join(", "),
                    invalid.iter().map(|c| c.data.node_type.as_str()).collect::<Vec<_>>().join(", ")
                ),
            )
            .related(invalid.iter().map(|c| c.id.clone())),
        ]
    }
}

struct ExcludeChildTypesRule;

impl CheckRule for ExcludeChildTypesRule {
    fn name(&self) -> &str {
        "children must not have an excluded type"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if node.data.task_id.is_empty() {
            return Vec::new();
        }
        let excluded = match declared(node, Constraint::Exclude) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::Exclude)],
            Declared::List(list) => list,
        };

        let invalid: Vec<&TaskNodeModel> = children(node, all_nodes).into_iter().filter(|c| excluded.contains(&c.data.node_type)).collect();
        if invalid.is_empty() {
            return Vec::new();
        }
        vec![
            CheckItem::error(
                "excluded child type",
                format!(
                    "children must not be of types: [{}], found: {}",
                    excluded.join(", "),
                    invalid.iter().map(|c| c.data.node_type.as_str()).collect::<Vec<_>>().join(", ")
                ),
            )
            .related(invalid.iter().map(|c| c.id.clone())),
        ]
    }
}

struct IncludeChildTypeRule;

impl CheckRule for IncludeChildTypeRule {
    fn name(&self) -> &str {
        "children must include a listed type"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if node.data.task_id.is_empty() {
            return Vec::new();
        }
        let included = match declared(node, Constraint::Include) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::Include)],
            Declared::List(list) => list,
        };

        let children = children(node, all_nodes);
        if children.iter().any(|c| included.contains(&c.data.node_type)) {
            return Vec::new();
        }
        vec![
            CheckItem::error("required child type missing", format!("at least one child must be of types: [{}]", included.join(", ")))
                .related(children.iter().map(|c| c.id.clone())),
        ]
    }
}

struct ParentRequiredFieldsRule;

impl CheckRule for ParentRequiredFieldsRule {
    fn name(&self) -> &str {
        "parent must fill preRequireField"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let fields = match declared(node, Constraint::PreRequireField) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::PreRequireField)],
            Declared::List(list) => list,
        };
        // an unresolved parent is reported by the parent rule
        let Some(parent) = find_by_task_id(&node.data.parent_task_id, all_nodes) else {
            return Vec::new();
        };

        let missing = missing_fields(parent, &fields);
        if missing.is_empty() {
            return Vec::new();
        }
        vec![CheckItem::error("parent is missing required fields", format!("parent must set fields: [{}]", missing.join(", "))).related([parent.id.clone()])]
    }
}

struct RequiredFieldsRule;

impl CheckRule for RequiredFieldsRule {
    fn name(&self) -> &str {
        "node must fill requireField"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        _all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let fields = match declared(node, Constraint::RequireField) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::RequireField)],
            Declared::List(list) => list,
        };

        let missing = missing_fields(node, &fields);
        if missing.is_empty() {
            return Vec::new();
        }
        vec![CheckItem::error("missing required fields", format!("fields must be set: [{}]", missing.join(", ")))]
    }
}

struct ChildRequiredFieldsRule;

impl CheckRule for ChildRequiredFieldsRule {
    fn name(&self) -> &str {
        "children must fill subRequireField"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        let fields = match declared(node, Constraint::SubRequireField) {
            Declared::Absent => return Vec::new(),
            Declared::Malformed => return vec![malformed(Constraint::SubRequireField)],
            Declared::List(list) => list,
        };

        let invalid: Vec<&TaskNodeModel> = children(node, all_nodes).into_iter().filter(|c| !missing_fields(c, &fields).is_empty()).collect();
        if invalid.is_empty() {
            return Vec::new();
        }
        vec![
            CheckItem::error("children are missing required fields", format!("children must set fields: [{}]", fields.join(", ")))
                .related(invalid.iter().map(|c| c.id.clone())),
        ]
    }
}

struct SingleRootRule;

impl CheckRule for SingleRootRule {
    fn name(&self) -> &str {
        "flow must have a single root"
    }

    fn apply(
        &self,
        node: &TaskNodeModel,
        all_nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        if !node.data.parent_task_id.is_empty() {
            return Vec::new();
        }
        let roots: Vec<&str> = all_nodes.iter().filter(|n| n.data.parent_task_id.is_empty()).map(|n| n.id.as_str()).collect();
        if roots.len() > 1 {
            return vec![CheckItem::error("multiple root nodes", "the flow has more than one node without a parent task").related(roots)];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::check::{CheckLevel, Checker};

    fn node(
        id: &str,
        parent: &str,
    ) -> TaskNodeModel {
        TaskNodeModel::new(id, "Task").with_parent(parent)
    }

    fn typed(
        id: &str,
        node_type: &str,
        parent: &str,
    ) -> TaskNodeModel {
        TaskNodeModel::new(id, node_type).with_parent(parent)
    }

    fn apply(
        rule: &dyn CheckRule,
        idx: usize,
        nodes: &[TaskNodeModel],
    ) -> Vec<CheckItem> {
        rule.apply(&nodes[idx], nodes)
    }

    fn related(item: &CheckItem) -> Vec<String> {
        item.related_ids.clone().unwrap_or_default()
    }

    #[test]
    fn test_duplicate_task_id_flags_every_holder() {
        let mut nodes = vec![node("a", ""), node("b", "a"), node("c", "a")];
        nodes[1].data.task_id = "dup".into();
        nodes[2].data.task_id = "dup".into();

        for idx in [1, 2] {
            let items = apply(&UniqueTaskIdRule, idx, &nodes);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].level, CheckLevel::Error);
            assert_eq!(related(&items[0]), vec!["b", "c"]);
        }
        assert!(apply(&UniqueTaskIdRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_duplicate_empty_task_id_ignored() {
        let mut nodes = vec![node("a", ""), node("b", "")];
        nodes[0].data.task_id.clear();
        nodes[1].data.task_id.clear();
        assert!(apply(&UniqueTaskIdRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_missing_parent_and_promise_warn() {
        let mut nodes = vec![node("a", "ghost")];
        nodes[0].data.promise_task_id = "nobody".into();

        let parent = apply(&ParentExistsRule, 0, &nodes);
        assert_eq!(parent[0].level, CheckLevel::Warn);
        assert_eq!(related(&parent[0]), vec!["a"]);

        assert_eq!(parent[0].message, "no node has taskId \"ghost\"");

        let promise = apply(&PromiseExistsRule, 0, &nodes);
        assert_eq!(promise[0].level, CheckLevel::Warn);
        assert_eq!(promise[0].message, "no node has taskId \"nobody\"");
    }

    #[test]
    fn test_self_parent_is_error() {
        let nodes = vec![node("a", "a")];
        let items = apply(&SelfParentRule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "node is its own parent");

        let clean = vec![node("a", "")];
        assert!(apply(&SelfParentRule, 0, &clean).is_empty());
    }

    #[test]
    fn test_time_range() {
        let rule = TimeRangeRule {
            day_time_types: Vec::new(),
        };
        let mut nodes = vec![node("a", "")];
        nodes[0].data.start_time = "2025-06-15".into();
        nodes[0].data.end_time = "2025-06-01".into();
        assert_eq!(apply(&rule, 0, &nodes)[0].level, CheckLevel::Error);

        nodes[0].data.end_time = "2025-06-15T10:00:00Z".into();
        assert!(apply(&rule, 0, &nodes).is_empty());

        nodes[0].data.start_time = "7".into();
        nodes[0].data.end_time = "3".into();
        assert!(apply(&rule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_time_range_unix_seconds() {
        let rule = TimeRangeRule {
            day_time_types: vec![2],
        };
        let mut nodes: Vec<TaskNodeModel> = serde_json::from_value(json!([
            {"id": "a", "data": {"taskId": "a", "timeType": 1, "startTime": 1717200000, "endTime": 1717100000}}
        ]))
        .unwrap();
        let items = apply(&rule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].level, CheckLevel::Error);

        nodes[0].data.end_time = "2024-06-01 00:00:01".into();
        assert!(apply(&rule, 0, &nodes).is_empty());

        nodes[0].data.end_time = "1717100000".into();
        nodes[0].data.time_type = Some(2);
        assert!(apply(&rule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_title_condition_type_and_reward() {
        let mut nodes = vec![node("a", "")];
        nodes[0].data.label = "  ".into();
        nodes[0].data.meta.kind = Some("ConditionTask".into());
        nodes[0].data.reward_type = "item".into();

        assert_eq!(apply(&TitlePresentRule, 0, &nodes)[0].level, CheckLevel::Warn);
        let rule = ConditionTaskTypeRule {
            condition_task_type: "ConditionTask".into(),
        };
        assert_eq!(apply(&rule, 0, &nodes).len(), 1);
        assert_eq!(apply(&RewardPairRule, 0, &nodes).len(), 1);

        nodes[0].data.task_type = "login_task".into();
        nodes[0].data.reward = "1001:1".into();
        assert!(apply(&rule, 0, &nodes).is_empty());
        assert!(apply(&RewardPairRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_cycle_detected_in_three_chain() {
        let nodes = vec![node("a", "c"), node("b", "a"), node("c", "b")];
        for idx in 0..3 {
            assert_eq!(apply(&ParentCycleRule, idx, &nodes).len(), 1);
        }
    }

    #[test]
    fn test_isolated_root_is_not_a_cycle() {
        let nodes = vec![node("a", "")];
        assert!(apply(&ParentCycleRule, 0, &nodes).is_empty());

        let chain = vec![node("a", ""), node("b", "a"), node("c", "b")];
        for idx in 0..3 {
            assert!(apply(&ParentCycleRule, idx, &chain).is_empty());
        }
    }

    #[test]
    fn test_node_leading_into_cycle_is_flagged() {
        let nodes = vec![node("a", "b"), node("b", "a"), node("tail", "a")];
        assert_eq!(apply(&ParentCycleRule, 2, &nodes).len(), 1);
    }

    #[test]
    fn test_duplicate_task_id_resolves_to_first() {
        let mut first = node("a", "");
        first.data.task_id = "x".into();
        let mut second = node("b", "y");
        second.data.task_id = "x".into();
        let nodes = vec![first, second, node("y", "x")];

        // y climbs to the first "x", a root
        assert!(apply(&ParentCycleRule, 2, &nodes).is_empty());
        assert!(apply(&ParentCycleRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_require_child_types() {
        let mut nodes = vec![typed("p", "Group", ""), typed("c1", "Task", "p"), typed("c2", "Reward", "p")];
        nodes[0].data.meta.require = Some(json!("[\"Task\"]"));

        let items = apply(&RequireChildTypesRule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(related(&items[0]), vec!["c2"]);
    }

    #[test]
    fn test_exclude_child_types() {
        let mut nodes = vec![typed("p", "Group", ""), typed("c1", "Task", "p"), typed("c2", "Reward", "p")];
        nodes[0].data.meta.exclude = Some(json!(["Reward"]));

        let items = apply(&ExcludeChildTypesRule, 0, &nodes);
        assert_eq!(related(&items[0]), vec!["c2"]);
    }

    #[test]
    fn test_include_child_type() {
        let mut nodes = vec![typed("p", "Group", ""), typed("c1", "Task", "p"), typed("c2", "Task", "p")];
        nodes[0].data.meta.include = Some(json!("[\"Reward\"]"));

        let items = apply(&IncludeChildTypeRule, 0, &nodes);
        assert_eq!(related(&items[0]), vec!["c1", "c2"]);

        nodes[2].data.node_type = "Reward".into();
        assert!(apply(&IncludeChildTypeRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_include_without_children_fails() {
        let mut nodes = vec![typed("p", "Group", "")];
        nodes[0].data.meta.include = Some(json!("[\"Reward\"]"));

        let items = apply(&IncludeChildTypeRule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].related_ids, Some(vec![]));
    }

    #[test]
    fn test_malformed_lists_degrade_to_error() {
        let mut nodes = vec![typed("p", "Group", ""), typed("c", "Task", "p")];
        nodes[0].data.meta.require = Some(json!("[Task"));
        nodes[0].data.meta.exclude = Some(json!("not json"));
        nodes[0].data.meta.include = Some(json!("{"));
        nodes[0].data.meta.require_field = Some(json!("{oops"));
        // p has no parent, the list is still reported unreadable
        nodes[0].data.meta.pre_require_field = Some(json!("[title"));
        nodes[0].data.meta.sub_require_field = Some(json!("[\"reward\""));

        let rules: [&dyn CheckRule; 6] = [
            &RequireChildTypesRule,
            &ExcludeChildTypesRule,
            &IncludeChildTypeRule,
            &ParentRequiredFieldsRule,
            &RequiredFieldsRule,
            &ChildRequiredFieldsRule,
        ];
        for rule in rules {
            let items = apply(rule, 0, &nodes);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].level, CheckLevel::Error);
            assert!(items[0].related_ids.is_none());
        }

        // the rest of the pass still runs for every node
        let report = Checker::default().check_all(&nodes);
        assert_eq!(report.entries().len(), 2);
        assert_eq!(report.get("p").unwrap().list.iter().filter(|i| i.related_ids.is_none()).count(), 6);
    }

    #[test]
    fn test_non_array_json_is_ignored() {
        let mut nodes = vec![typed("p", "Group", ""), typed("c", "Task", "p")];
        nodes[0].data.meta.require = Some(json!("{\"a\":1}"));
        nodes[0].data.meta.require_field = Some(json!("[]"));
        assert!(apply(&RequireChildTypesRule, 0, &nodes).is_empty());
        assert!(apply(&RequiredFieldsRule, 0, &nodes).is_empty());
    }

    #[test]
    fn test_parent_required_fields() {
        let mut nodes = vec![node("p", ""), node("c", "p")];
        nodes[1].data.meta.pre_require_field = Some(json!("[\"reward\", \"label\"]"));

        let items = apply(&ParentRequiredFieldsRule, 1, &nodes);
        assert_eq!(items.len(), 1);
        assert!(items[0].message.contains("reward"));
        assert!(!items[0].message.contains("label"));
        assert_eq!(related(&items[0]), vec!["p"]);

        let orphan = vec![{
            let mut n = node("c", "ghost");
            n.data.meta.pre_require_field = Some(json!("[\"reward\"]"));
            n
        }];
        assert!(apply(&ParentRequiredFieldsRule, 0, &orphan).is_empty());
    }

    #[test]
    fn test_own_required_fields() {
        let mut nodes = vec![node("a", "")];
        nodes[0].data.meta.require_field = Some(json!("[\"weight\", \"desc\"]"));
        nodes[0].data.weight = Some(10);

        let items = apply(&RequiredFieldsRule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message, "fields must be set: [desc]");
    }

    #[test]
    fn test_child_required_fields_per_child() {
        let mut nodes = vec![node("p", ""), node("c1", "p"), node("c2", "p")];
        nodes[0].data.meta.sub_require_field = Some(json!("[\"reward\", \"desc\"]"));
        nodes[1].data.reward = "gold".into();
        nodes[1].data.desc = "done".into();
        nodes[2].data.reward = "gold".into();

        let items = apply(&ChildRequiredFieldsRule, 0, &nodes);
        assert_eq!(items.len(), 1);
        assert_eq!(related(&items[0]), vec!["c2"]);
    }

    #[test]
    fn test_single_root() {
        let nodes = vec![node("1", ""), node("2", "1"), node("3", "")];

        for idx in [0, 2] {
            let items = apply(&SingleRootRule, idx, &nodes);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].level, CheckLevel::Error);
            assert_eq!(related(&items[0]), vec!["1", "3"]);
        }
        assert!(apply(&SingleRootRule, 1, &nodes).is_empty());
    }

    #[test]
    fn test_self_parent_yields_self_parent_error_regardless_of_others() {
        let nodes = vec![node("r", ""), node("x", "x")];
        let result = Checker::default().check_node(&nodes[1], &nodes);
        let self_parent: Vec<_> = result.list.iter().filter(|i| i.title == "node is its own parent").collect();
        assert_eq!(self_parent.len(), 1);
    }

    #[test]
    fn test_clean_flow_has_no_findings() {
        let nodes = vec![node("root", ""), node("a", "root"), node("b", "root")];
        let report = Checker::default().check_all(&nodes);
        assert_eq!(report.level(), CheckLevel::Success);
    }
}
