use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::{
    model::{Constraint, TaskMeta},
    store::{DbCollectionIden, StoreIden},
};

/// Catalog entry describing a category of task, keyed by `value`.
///
/// Constraint lists are kept as JSON array text, `"[]"` when empty.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskType {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub desc: String,
    pub mark: String,
    pub class_name: String,
    pub inheritance: String,
    pub include: String,
    pub exclude: String,
    pub require: String,
    pub require_field: String,
    pub pre_require_field: String,
    pub sub_require_field: String,
}

impl Default for TaskType {
    fn default() -> Self {
        let empty = || "[]".to_string();
        Self {
            value: String::new(),
            kind: String::new(),
            desc: String::new(),
            mark: String::new(),
            class_name: String::new(),
            inheritance: empty(),
            include: empty(),
            exclude: empty(),
            require: empty(),
            require_field: empty(),
            pre_require_field: empty(),
            sub_require_field: empty(),
        }
    }
}

impl DbCollectionIden for TaskType {
    fn iden() -> StoreIden {
        StoreIden::TaskTypes
    }
}

impl TaskType {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn constraint(
        &self,
        c: Constraint,
    ) -> &str {
        match c {
            Constraint::Inheritance => &self.inheritance,
            Constraint::Include => &self.include,
            Constraint::Exclude => &self.exclude,
            Constraint::Require => &self.require,
            Constraint::RequireField => &self.require_field,
            Constraint::PreRequireField => &self.pre_require_field,
            Constraint::SubRequireField => &self.sub_require_field,
        }
    }

    pub fn constraint_mut(
        &mut self,
        c: Constraint,
    ) -> &mut String {
        match c {
            Constraint::Inheritance => &mut self.inheritance,
            Constraint::Include => &mut self.include,
            Constraint::Exclude => &mut self.exclude,
            Constraint::Require => &mut self.require,
            Constraint::RequireField => &mut self.require_field,
            Constraint::PreRequireField => &mut self.pre_require_field,
            Constraint::SubRequireField => &mut self.sub_require_field,
        }
    }

    /// Metadata attached to a node created from this type.
    pub fn to_meta(&self) -> TaskMeta {
        let text = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        let mut meta = TaskMeta {
            value: self.value.clone(),
            kind: text(&self.kind),
            desc: text(&self.desc),
            mark: text(&self.mark),
            class_name: text(&self.class_name),
            ..Default::default()
        };
        for c in Constraint::iter() {
            meta.set_constraint(c, Value::String(self.constraint(c).to_string()));
        }
        meta
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_meta() {
        let mut task_type = TaskType::new("Group");
        task_type.kind = "ConditionTask".into();
        task_type.require = "[\"Task\"]".into();

        let meta = task_type.to_meta();
        assert_eq!(meta.value, "Group");
        assert_eq!(meta.kind.as_deref(), Some("ConditionTask"));
        assert_eq!(meta.desc, None);
        assert_eq!(meta.require, Some(json!("[\"Task\"]")));
        assert_eq!(meta.sub_require_field, Some(json!("[]")));
    }
}
