use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};
use strum::{AsRefStr, EnumIter};

/// Render type given to nodes created by the editor.
pub const DEFAULT_NODE_KIND: &str = "stacked";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            x,
            y,
        }
    }
}

/// A task node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNodeModel {
    pub id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Hidden beneath a collapsed ancestor. Transient.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default)]
    pub data: TaskData,
}

impl Default for TaskNodeModel {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: default_kind(),
            position: Position::default(),
            width: None,
            height: None,
            hidden: false,
            data: TaskData::default(),
        }
    }
}

impl TaskNodeModel {
    /// Node whose id and task id are both `id`.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            data: TaskData {
                label: id.clone(),
                task_id: id.clone(),
                node_type: node_type.into(),
                ..Default::default()
            },
            id,
            ..Default::default()
        }
    }

    pub fn with_parent(
        mut self,
        parent_task_id: impl Into<String>,
    ) -> Self {
        self.data.parent_task_id = parent_task_id.into();
        self
    }
}

/// Business payload of a task node.
///
/// Numeric scalars tolerate numeric strings and empty strings, and text
/// scalars tolerate numbers, since flows are often imported from
/// spreadsheet exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskData {
    pub meta: TaskMeta,
    #[serde(deserialize_with = "de_text")]
    pub label: String,
    #[serde(deserialize_with = "de_text")]
    pub activity_id: String,
    /// Node id of the parent, set by the canonical editor and the template importer.
    #[serde(deserialize_with = "de_text")]
    pub parent_id: String,
    #[serde(deserialize_with = "de_text")]
    pub parent_task_id: String,
    #[serde(deserialize_with = "de_text")]
    pub promise_task_id: String,
    #[serde(deserialize_with = "de_text")]
    pub task_id: String,
    #[serde(deserialize_with = "de_text")]
    pub node_type: String,
    #[serde(deserialize_with = "de_text")]
    pub task_type: String,
    #[serde(deserialize_with = "de_number", skip_serializing_if = "Option::is_none")]
    pub target_process: Option<i64>,
    #[serde(deserialize_with = "de_number", skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(deserialize_with = "de_text")]
    pub condition: String,
    #[serde(deserialize_with = "de_text")]
    pub reward_type: String,
    #[serde(deserialize_with = "de_text")]
    pub reward: String,
    #[serde(deserialize_with = "de_text")]
    pub desc: String,
    #[serde(deserialize_with = "de_number", skip_serializing_if = "Option::is_none")]
    pub sort_id: Option<i64>,
    #[serde(deserialize_with = "de_number", skip_serializing_if = "Option::is_none")]
    pub time_type: Option<i64>,
    #[serde(deserialize_with = "de_text")]
    pub start_time: String,
    #[serde(deserialize_with = "de_text")]
    pub end_time: String,
    #[serde(deserialize_with = "de_text")]
    pub start_time_str: String,
    #[serde(deserialize_with = "de_text")]
    pub end_time_str: String,
    #[serde(deserialize_with = "de_number", skip_serializing_if = "Option::is_none")]
    pub offset_time: Option<i64>,
    #[serde(deserialize_with = "de_object")]
    pub extra_info: Map<String, Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Keys this model does not know about, kept round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskData {
    /// Looks a field up by its JSON name.
    pub fn field(
        &self,
        name: &str,
    ) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(name),
            _ => None,
        }
    }

    /// Whether the named field is absent or blank.
    pub fn is_field_blank(
        &self,
        name: &str,
    ) -> bool {
        self.field(name).map(|v| is_blank(&v)).unwrap_or(true)
    }
}

/// A value is blank when it is null, a whitespace-only string or an
/// array whose elements are all blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        _ => false,
    }
}

/// Constraint lists a task type may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Constraint {
    Inheritance,
    Include,
    Exclude,
    Require,
    RequireField,
    PreRequireField,
    SubRequireField,
}

/// Task type metadata copied onto a node when it is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inheritance: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_field: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_require_field: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_require_field: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskMeta {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn constraint(
        &self,
        c: Constraint,
    ) -> Option<&Value> {
        match c {
            Constraint::Inheritance => self.inheritance.as_ref(),
            Constraint::Include => self.include.as_ref(),
            Constraint::Exclude => self.exclude.as_ref(),
            Constraint::Require => self.require.as_ref(),
            Constraint::RequireField => self.require_field.as_ref(),
            Constraint::PreRequireField => self.pre_require_field.as_ref(),
            Constraint::SubRequireField => self.sub_require_field.as_ref(),
        }
    }

    pub fn set_constraint(
        &mut self,
        c: Constraint,
        value: impl Into<Value>,
    ) {
        let value = Some(value.into());
        match c {
            Constraint::Inheritance => self.inheritance = value,
            Constraint::Include => self.include = value,
            Constraint::Exclude => self.exclude = value,
            Constraint::Require => self.require = value,
            Constraint::RequireField => self.require_field = value,
            Constraint::PreRequireField => self.pre_require_field = value,
            Constraint::SubRequireField => self.sub_require_field = value,
        }
    }
}

fn default_kind() -> String {
    DEFAULT_NODE_KIND.to_string()
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn de_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(|f| Some(f as i64)).map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
        other => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

fn de_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(D::Error::custom("extraInfo must be an object")),
        },
        other => Err(D::Error::custom(format!("extraInfo must be an object, got {}", other))),
    }
}
