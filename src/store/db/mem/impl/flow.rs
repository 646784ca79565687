use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::{
    Result,
    store::{data::TaskFlow, db::mem::DbDocument},
};

impl DbDocument for TaskFlow {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        let mut map = HashMap::new();
        map.insert("id".to_string(), json!(self.id.clone()));
        map.insert("title".to_string(), json!(self.title.clone()));
        map.insert("description".to_string(), json!(self.description.clone()));
        map.insert("create_time".to_string(), json!(self.create_time));
        map.insert("update_time".to_string(), json!(self.update_time));
        Ok(map)
    }
}
