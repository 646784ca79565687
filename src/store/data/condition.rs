use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// A reusable condition record. `and` / `or` conditions list the ids of
/// their sub conditions in `value`, comma separated.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskCondition {
    pub id: i64,
    pub operator: String,
    pub condition_type: String,
    pub value: String,
    pub desc: String,
}

impl DbCollectionIden for TaskCondition {
    fn iden() -> StoreIden {
        StoreIden::TaskConditions
    }
}

impl TaskCondition {
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}
