//! Bulk JSON importers for task types, conditions and flow templates.
//!
//! Every importer parses the whole file before writing anything, so a
//! file that cannot be read leaves the store untouched.

use std::{collections::HashMap, fmt};

use serde_json::{Map, Value};
use strum::IntoEnumIterator;
use tracing::info;
use uuid::Uuid;

use crate::{
    Result, TaskflowError,
    catalog::CatalogSnapshot,
    model::{Constraint, DEFAULT_NODE_KIND, Position, TaskData, TaskEdgeModel, TaskFlowModel, TaskMeta, TaskNodeModel},
    store::{
        Store,
        data::{TaskCondition, TaskType},
    },
};

const META_INFO_KEY: &str = "__META_INFO__";
const UNKNOWN_ACTIVITY: &str = "unknown";

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "created {}, updated {}", self.created, self.updated)
    }
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| TaskflowError::Import(format!("invalid json: {}", e)))
}

/// Values of an exported object, numeric row keys in numeric order.
fn row_values(
    map: Map<String, Value>,
    skip: impl Fn(&str) -> bool,
) -> Vec<Value> {
    let mut rows: Vec<(String, Value)> = map.into_iter().filter(|(k, _)| !skip(k)).collect();
    rows.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    rows.into_iter().map(|(_, v)| v).collect()
}

/// Entries of a JSON array, or the values of an object whose keys do not
/// start with `__`.
fn entries(value: Value) -> Result<Vec<Map<String, Value>>> {
    let items: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) => row_values(map, |k| k.starts_with("__")),
        _ => return Err(TaskflowError::Import("expected a JSON array or object".into())),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(TaskflowError::Import(format!("entry {} is not an object: {}", i, other))),
        })
        .collect()
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Constraint lists are stored as JSON text, `"[]"` when missing.
fn list_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "[]".to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => "[]".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn parse_task_types(text_in: &str) -> Result<Vec<TaskType>> {
    entries(parse_json(text_in)?)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let value = text(item.get("value"));
            if value.trim().is_empty() {
                return Err(TaskflowError::Import(format!("task type {} has no value", i)));
            }
            let mut task_type = TaskType {
                value,
                kind: text(item.get("type")),
                desc: text(item.get("desc")),
                mark: text(item.get("mark")),
                class_name: text(item.get("className")),
                ..Default::default()
            };
            for c in Constraint::iter() {
                *task_type.constraint_mut(c) = list_text(item.get(c.as_ref()));
            }
            Ok(task_type)
        })
        .collect()
}

/// Imports task types, matching existing records on `value`.
pub fn import_task_types(
    store: &Store,
    text_in: &str,
) -> Result<ImportSummary> {
    let task_types = parse_task_types(text_in)?;
    let collection = store.task_types()?;

    let mut summary = ImportSummary::default();
    for task_type in &task_types {
        if collection.exists(&task_type.value)? {
            collection.update(task_type)?;
            summary.updated += 1;
        } else {
            collection.create(task_type)?;
            summary.created += 1;
        }
    }
    info!("task types imported: {}", summary);
    Ok(summary)
}

fn condition_id(value: Option<&Value>) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| TaskflowError::Import(format!("invalid condition id {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| TaskflowError::Import(format!("invalid condition id '{}'", s))),
        Some(other) => Err(TaskflowError::Import(format!("invalid condition id {}", other))),
    }
}

/// Conditions as read from a file; `id` is absent for new records.
pub fn parse_conditions(text_in: &str) -> Result<Vec<(Option<i64>, TaskCondition)>> {
    entries(parse_json(text_in)?)?
        .into_iter()
        .map(|item| {
            let id = condition_id(item.get("id"))?;
            let value = match item.get("value") {
                Some(Value::Array(items)) => items.iter().map(|v| text(Some(v))).collect::<Vec<_>>().join(","),
                other => text(other),
            };
            let condition = TaskCondition {
                id: id.unwrap_or_default(),
                operator: text(item.get("operator")),
                condition_type: text(item.get("conditionType")),
                value,
                desc: text(item.get("desc")),
            };
            Ok((id, condition))
        })
        .collect()
}

/// Imports conditions, matching on `id`. Entries without an id, or with
/// an id not stored yet, are created; missing ids are assigned past the
/// largest id in use.
pub fn import_conditions(
    store: &Store,
    text_in: &str,
) -> Result<ImportSummary> {
    let conditions = parse_conditions(text_in)?;
    let collection = store.conditions()?;

    let mut next_id = store.next_condition_id()?;
    for (id, _) in &conditions {
        if let Some(id) = id {
            next_id = next_id.max(id + 1);
        }
    }

    let mut summary = ImportSummary::default();
    for (id, mut condition) in conditions {
        match id {
            Some(id) if collection.exists(&id.to_string())? => {
                collection.update(&condition)?;
                summary.updated += 1;
            }
            Some(_) => {
                collection.create(&condition)?;
                summary.created += 1;
            }
            None => {
                condition.id = next_id;
                next_id += 1;
                collection.create(&condition)?;
                summary.created += 1;
            }
        }
    }
    info!("conditions imported: {}", summary);
    Ok(summary)
}

/// Rows of one activity found in a template export.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowBundle {
    pub activity_id: String,
    pub rows: Vec<Map<String, Value>>,
}

/// Groups the rows of an exported object-of-objects by `activityId`, in
/// order of first appearance.
pub fn parse_flow_bundles(text_in: &str) -> Result<Vec<FlowBundle>> {
    let rows: Vec<Value> = match parse_json(text_in)? {
        Value::Object(map) => row_values(map, |k| k == META_INFO_KEY),
        Value::Array(items) => items,
        _ => return Err(TaskflowError::Import("expected a JSON object of rows".into())),
    };

    let mut bundles: Vec<FlowBundle> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, row) in rows.into_iter().enumerate() {
        let Value::Object(row) = row else {
            return Err(TaskflowError::Import(format!("row {} is not an object", i)));
        };
        let activity_id = Some(text(row.get("activityId"))).filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN_ACTIVITY.to_string());
        let slot = *index.entry(activity_id.clone()).or_insert_with(|| {
            bundles.push(FlowBundle {
                activity_id,
                rows: Vec::new(),
            });
            bundles.len() - 1
        });
        bundles[slot].rows.push(row);
    }
    Ok(bundles)
}

/// Node every imported row is merged into.
fn node_template() -> TaskNodeModel {
    TaskNodeModel {
        id: "Task_init".to_string(),
        kind: DEFAULT_NODE_KIND.to_string(),
        width: Some(220.0),
        height: Some(182.0),
        position: Position::default(),
        hidden: false,
        data: TaskData {
            meta: unknown_meta("Task"),
            node_type: "Task".to_string(),
            offset_time: Some(0),
            ..Default::default()
        },
    }
}

fn unknown_meta(value: &str) -> TaskMeta {
    TaskMeta {
        kind: Some("unknown".to_string()),
        desc: Some("unknown task".to_string()),
        mark: Some(String::new()),
        ..TaskMeta::new(value)
    }
}

/// Recursively merges `source` into `target`; objects merge key by key,
/// anything else replaces.
fn deep_merge(
    target: &mut Value,
    source: Value,
) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

impl FlowBundle {
    /// Builds a template from the rows. Nodes get fresh uuid ids and are
    /// linked to their parent through `parentTaskId`.
    pub fn into_template(
        &self,
        title: &str,
        description: &str,
        catalog: &CatalogSnapshot,
    ) -> Result<TaskFlowModel> {
        if title.trim().is_empty() {
            return Err(TaskflowError::Import(format!("title is required for activity {}", self.activity_id)));
        }

        let template = serde_json::to_value(node_template().data)?;
        let mut nodes = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let mut row = row.clone();
            row.remove("__ROW_INDEX__");
            row.remove("activityId");

            let task_id = text(row.get("taskId"));
            let node_type = text(row.get("nodeType"));
            let label = Some(text(row.get("desc"))).filter(|s| !s.is_empty()).unwrap_or_else(|| task_id.clone());
            let meta = catalog.task_meta(&node_type).unwrap_or_else(|| unknown_meta(if node_type.is_empty() { "Task" } else { &node_type }));

            let mut data = template.clone();
            deep_merge(&mut data, Value::Object(row));
            let mut data: TaskData = serde_json::from_value(data).map_err(|e| TaskflowError::Import(format!("row {} of activity {}: {}", i, self.activity_id, e)))?;
            data.label = label;
            data.meta = meta;

            nodes.push(TaskNodeModel {
                id: Uuid::new_v4().to_string(),
                data,
                ..node_template()
            });
        }

        let mut by_task_id: HashMap<String, String> = HashMap::new();
        for node in &nodes {
            by_task_id.insert(node.data.task_id.clone(), node.id.clone());
        }
        let mut edges = Vec::new();
        for node in nodes.iter_mut() {
            node.data.parent_id = match by_task_id.get(&node.data.parent_task_id) {
                Some(parent) if !node.data.parent_task_id.is_empty() => parent.clone(),
                _ => String::new(),
            };
            if !node.data.parent_id.is_empty() {
                edges.push(TaskEdgeModel::link(node.data.parent_id.clone(), node.id.clone()));
            }
        }

        Ok(TaskFlowModel {
            id: format!("tmpl_{}", Uuid::new_v4()),
            title: title.to_string(),
            description: description.to_string(),
            nodes,
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DbStore, MemStore};

    fn mem_store() -> Store {
        let store = Store::new();
        MemStore::new().init(&store).unwrap();
        store
    }

    #[test]
    fn test_import_task_types_create_then_update() {
        let store = mem_store();
        let first = r#"[
            {"value": "Task", "type": "ConditionTask", "require": ["Reward"]},
            {"value": "Group", "desc": "group"}
        ]"#;
        let summary = import_task_types(&store, first).unwrap();
        assert_eq!(summary, ImportSummary { created: 2, updated: 0 });
        assert_eq!(summary.to_string(), "created 2, updated 0");

        let task = store.task_types().unwrap().find("Task").unwrap();
        assert_eq!(task.require, "[\"Reward\"]");
        assert_eq!(task.include, "[]");

        let second = r#"{"__META_INFO__": {"v": 1}, "a": {"value": "Task", "desc": "changed"}, "b": {"value": "Reward"}}"#;
        let summary = import_task_types(&store, second).unwrap();
        assert_eq!(summary, ImportSummary { created: 1, updated: 1 });
        assert_eq!(store.task_types().unwrap().find("Task").unwrap().desc, "changed");
    }

    #[test]
    fn test_import_task_types_rejects_bad_file() {
        let store = mem_store();
        assert!(matches!(import_task_types(&store, "{oops"), Err(TaskflowError::Import(_))));
        assert!(import_task_types(&store, r#"[{"value": "A"}, {"desc": "no value"}]"#).is_err());
        // nothing written on failure
        assert_eq!(store.all_task_types().unwrap().len(), 0);
    }

    #[test]
    fn test_import_conditions() {
        let store = mem_store();
        let text = r#"{
            "__META_INFO__": {},
            "1": {"id": 5, "operator": "Equal", "conditionType": "level", "value": "10"},
            "2": {"operator": "and", "value": ["5", "6"]},
            "3": {"id": "6", "operator": "GreaterThan", "value": 3}
        }"#;
        let summary = import_conditions(&store, text).unwrap();
        assert_eq!(summary.created, 3);

        let all = store.all_conditions().unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(store.find_condition(7).unwrap().value, "5,6");
        assert_eq!(store.find_condition(6).unwrap().value, "3");

        let summary = import_conditions(&store, r#"[{"id": 5, "operator": "NotEqual"}]"#).unwrap();
        assert_eq!(summary, ImportSummary { created: 0, updated: 1 });
        assert_eq!(store.find_condition(5).unwrap().operator, "NotEqual");
    }

    #[test]
    fn test_parse_flow_bundles_groups_by_activity() {
        let text = r#"{
            "__META_INFO__": {"sheet": "x"},
            "1": {"activityId": "A", "taskId": "1"},
            "2": {"activityId": "B", "taskId": "2"},
            "3": {"activityId": "A", "taskId": "3"},
            "4": {"taskId": "4"}
        }"#;
        let bundles = parse_flow_bundles(text).unwrap();
        assert_eq!(bundles.iter().map(|b| b.activity_id.as_str()).collect::<Vec<_>>(), vec!["A", "B", "unknown"]);
        assert_eq!(bundles[0].rows.len(), 2);
        assert!(parse_flow_bundles("[1]").is_err());
    }

    #[test]
    fn test_rows_follow_numeric_key_order() {
        let text = r#"{"10": {"taskId": "c"}, "2": {"taskId": "b"}, "1": {"taskId": "a"}}"#;
        let bundle = parse_flow_bundles(text).unwrap().remove(0);
        let ids: Vec<String> = bundle.rows.iter().map(|r| text_of(r, "taskId")).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    fn text_of(
        row: &Map<String, Value>,
        key: &str,
    ) -> String {
        super::text(row.get(key))
    }

    #[test]
    fn test_bundle_into_template() {
        let text = r#"{
            "1": {"activityId": "A", "taskId": "100", "nodeType": "Group", "desc": "root", "weight": "5"},
            "2": {"activityId": "A", "taskId": "101", "parentTaskId": "100", "nodeType": "Task", "extraInfo": "{\"k\":1}"},
            "3": {"activityId": "A", "taskId": "102", "parentTaskId": "999"}
        }"#;
        let bundle = parse_flow_bundles(text).unwrap().remove(0);
        let mut catalog = CatalogSnapshot::default();
        catalog.task_types.push(TaskType::new("Group"));

        let flow = bundle.into_template("Daily", "", &catalog).unwrap();
        assert!(flow.id.starts_with("tmpl_"));
        assert_eq!(flow.nodes.len(), 3);

        let root = &flow.nodes[0];
        assert_eq!(root.data.label, "root");
        assert_eq!(root.data.weight, Some(5));
        assert_eq!(root.data.meta.value, "Group");
        assert_eq!(root.width, Some(220.0));
        assert!(root.data.activity_id.is_empty());

        let child = &flow.nodes[1];
        assert_eq!(child.data.label, "101");
        assert_eq!(child.data.parent_id, root.id);
        assert_eq!(child.data.meta.kind.as_deref(), Some("unknown"));
        assert_eq!(child.data.extra_info.get("k"), Some(&serde_json::json!(1)));

        assert!(flow.nodes[2].data.parent_id.is_empty());
        assert_eq!(flow.edges.len(), 1);
        assert_eq!(flow.edges[0].id, format!("edge-{}-{}", root.id, child.id));

        assert!(bundle.into_template("", "", &catalog).is_err());
    }

    #[test]
    fn test_bundle_bad_row_is_import_error() {
        let bundle = parse_flow_bundles(r#"{"1": {"taskId": "1", "weight": "heavy"}}"#).unwrap().remove(0);
        let err = bundle.into_template("t", "", &CatalogSnapshot::default()).unwrap_err();
        assert!(matches!(err, TaskflowError::Import(_)));
    }
}
