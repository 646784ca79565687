use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::{
    Result,
    store::{data::TaskType, db::mem::DbDocument},
};

impl DbDocument for TaskType {
    fn id(&self) -> String {
        self.value.clone()
    }

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        let mut map = HashMap::new();
        map.insert("value".to_string(), json!(self.value.clone()));
        map.insert("type".to_string(), json!(self.kind.clone()));
        map.insert("desc".to_string(), json!(self.desc.clone()));
        map.insert("mark".to_string(), json!(self.mark.clone()));
        map.insert("class_name".to_string(), json!(self.class_name.clone()));
        Ok(map)
    }
}
