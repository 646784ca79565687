use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::{
    Result,
    store::{data::TaskCondition, db::mem::DbDocument},
};

impl DbDocument for TaskCondition {
    fn id(&self) -> String {
        self.key()
    }

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        let mut map = HashMap::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("operator".to_string(), json!(self.operator.clone()));
        map.insert("condition_type".to_string(), json!(self.condition_type.clone()));
        map.insert("value".to_string(), json!(self.value.clone()));
        map.insert("desc".to_string(), json!(self.desc.clone()));
        Ok(map)
    }
}
