mod collect;
mod r#impl;

use std::{collections::HashMap, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::{
    Result,
    store::{DbCollection, DbStore, Store, data::*},
};
pub use collect::Collect;

#[derive(Debug, Clone)]
pub struct MemStore {
    flows: Arc<Collect<TaskFlow>>,
    task_types: Arc<Collect<TaskType>>,
    conditions: Arc<Collect<TaskCondition>>,
}

trait DbDocument: Serialize + DeserializeOwned {
    fn id(&self) -> String;
    fn doc(&self) -> Result<HashMap<String, JsonValue>>;
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DbStore for MemStore {
    fn init(
        &self,
        s: &Store,
    ) -> Result<()> {
        s.register(self.flows())?;
        s.register(self.task_types())?;
        s.register(self.conditions())?;
        Ok(())
    }
}

impl MemStore {
    pub fn new() -> Self {
        let flows = Collect::new("act_task_flow");
        let task_types = Collect::new("act_task_type");
        let conditions = Collect::new("act_task_condition");

        Self {
            flows: Arc::new(flows),
            task_types: Arc::new(task_types),
            conditions: Arc::new(conditions),
        }
    }

    pub fn flows(&self) -> Arc<dyn DbCollection<Item = TaskFlow> + Send + Sync> {
        self.flows.clone()
    }

    pub fn task_types(&self) -> Arc<dyn DbCollection<Item = TaskType> + Send + Sync> {
        self.task_types.clone()
    }

    pub fn conditions(&self) -> Arc<dyn DbCollection<Item = TaskCondition> + Send + Sync> {
        self.conditions.clone()
    }
}
