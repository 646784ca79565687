use std::{
    any::Any,
    collections::HashMap,
    convert::AsRef,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{Result, ShareLock, TaskflowError, model::TaskFlowModel, utils};

use super::{
    DbCollection, DbCollectionIden, PageData, StoreIden,
    data::*,
    query::{DEFAULT_LIMIT, Query},
};

#[derive(Clone)]
pub struct DynDbSetRef<T>(Arc<dyn DbCollection<Item = T>>);

/// Registry of the collections of one backend.
pub struct Store {
    collections: ShareLock<HashMap<StoreIden, Arc<dyn Any + Send + Sync + 'static>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn collection<DATA>(&self) -> Result<Arc<dyn DbCollection<Item = DATA>>>
    where
        DATA: DbCollectionIden + Send + Sync + 'static,
    {
        let missing = || TaskflowError::Store(format!("fail to get collection: {}", DATA::iden().as_ref()));
        let collections = self.collections.read().map_err(|_| TaskflowError::Store("store registry lock poisoned".into()))?;

        let collection = collections.get(&DATA::iden()).ok_or_else(missing)?;
        collection.downcast_ref::<DynDbSetRef<DATA>>().map(|v| v.0.clone()).ok_or_else(missing)
    }

    pub fn register<DATA>(
        &self,
        collection: Arc<dyn DbCollection<Item = DATA> + Send + Sync + 'static>,
    ) -> Result<()>
    where
        DATA: DbCollectionIden + 'static,
    {
        let mut collections = self.collections.write().map_err(|_| TaskflowError::Store("store registry lock poisoned".into()))?;
        collections.insert(DATA::iden(), Arc::new(DynDbSetRef::<DATA>(collection)));
        Ok(())
    }

    pub fn flows(&self) -> Result<Arc<dyn DbCollection<Item = TaskFlow>>> {
        self.collection()
    }

    pub fn task_types(&self) -> Result<Arc<dyn DbCollection<Item = TaskType>>> {
        self.collection()
    }

    pub fn conditions(&self) -> Result<Arc<dyn DbCollection<Item = TaskCondition>>> {
        self.collection()
    }

    /// Creates or updates a template. The creation time of an existing
    /// template is kept.
    pub fn save_flow(
        &self,
        flow: &TaskFlowModel,
    ) -> Result<bool> {
        trace!("store::save_flow({})", flow.id);
        if flow.id.is_empty() {
            return Err(TaskflowError::Flow("missing id in task flow".into()));
        }
        if flow.title.trim().is_empty() {
            return Err(TaskflowError::Flow("missing title in task flow".into()));
        }
        let flows = self.flows()?;
        let flow = flow.for_save();
        let mut data = TaskFlow {
            id: flow.id,
            title: flow.title,
            description: flow.description,
            nodes: flow.nodes,
            edges: flow.edges,
            create_time: utils::time::time_millis(),
            update_time: 0,
        };
        if flows.exists(&data.id)? {
            let old = flows.find(&data.id)?;
            data.create_time = old.create_time;
            data.update_time = utils::time::time_millis();
            flows.update(&data)
        } else {
            flows.create(&data)
        }
    }

    pub fn load_flow(
        &self,
        id: &str,
    ) -> Result<TaskFlowModel> {
        trace!("store::load_flow({})", id);
        Ok(self.flows()?.find(id)?.model())
    }

    pub fn list_flows(
        &self,
        q: &Query,
    ) -> Result<PageData<TaskFlow>> {
        self.flows()?.query(q)
    }

    pub fn delete_flow(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("store::delete_flow({})", id);
        self.flows()?.delete(id)
    }

    /// Every task type, up to the default page size.
    pub fn all_task_types(&self) -> Result<Vec<TaskType>> {
        Ok(self.task_types()?.query(&Query::new().set_limit(DEFAULT_LIMIT))?.rows)
    }

    /// Every condition ordered by id, up to the default page size.
    pub fn all_conditions(&self) -> Result<Vec<TaskCondition>> {
        Ok(self.conditions()?.query(&Query::new().set_order("id", false).set_limit(DEFAULT_LIMIT))?.rows)
    }

    pub fn find_condition(
        &self,
        id: i64,
    ) -> Result<TaskCondition> {
        self.conditions()?.find(&id.to_string())
    }

    /// Next free condition id: one past the largest stored id.
    pub fn next_condition_id(&self) -> Result<i64> {
        let page = self.conditions()?.query(&Query::new().set_order("id", true).set_limit(1))?;
        Ok(page.rows.first().map(|c| c.id).unwrap_or(0) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::TaskNodeModel,
        store::{DbStore, MemStore},
    };

    fn mem_store() -> Store {
        let store = Store::new();
        MemStore::new().init(&store).unwrap();
        store
    }

    #[test]
    fn test_missing_collection_is_error() {
        let store = Store::new();
        assert!(matches!(store.flows(), Err(TaskflowError::Store(_))));
    }

    #[test]
    fn test_save_flow_upsert() {
        let store = mem_store();
        let mut flow = TaskFlowModel {
            id: "tmpl_1".into(),
            title: "Daily".into(),
            nodes: vec![TaskNodeModel::new("Task_1", "Task")],
            ..Default::default()
        };
        assert!(store.save_flow(&flow).unwrap());
        let created = store.flows().unwrap().find("tmpl_1").unwrap();
        assert_eq!(created.update_time, 0);

        flow.title = "Weekly".into();
        assert!(store.save_flow(&flow).unwrap());
        let updated = store.flows().unwrap().find("tmpl_1").unwrap();
        assert_eq!(updated.title, "Weekly");
        assert_eq!(updated.create_time, created.create_time);
        assert!(updated.update_time > 0);

        assert_eq!(store.load_flow("tmpl_1").unwrap().nodes.len(), 1);
        assert_eq!(store.list_flows(&Query::new()).unwrap().count, 1);
        assert!(store.delete_flow("tmpl_1").unwrap());
        assert!(store.load_flow("tmpl_1").is_err());
    }

    #[test]
    fn test_save_flow_requires_id_and_title() {
        let store = mem_store();
        let flow = TaskFlowModel {
            title: "x".into(),
            ..Default::default()
        };
        assert!(store.save_flow(&flow).is_err());
        let flow = TaskFlowModel {
            id: "a".into(),
            ..Default::default()
        };
        assert!(store.save_flow(&flow).is_err());
    }

    #[test]
    fn test_next_condition_id() {
        let store = mem_store();
        assert_eq!(store.next_condition_id().unwrap(), 1);

        let conditions = store.conditions().unwrap();
        for id in [4, 9, 2] {
            conditions
                .create(&TaskCondition {
                    id,
                    operator: "Equal".into(),
                    ..Default::default()
                })
                .unwrap();
        }
        assert_eq!(store.next_condition_id().unwrap(), 10);
        assert_eq!(store.all_conditions().unwrap().iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 4, 9]);
        assert_eq!(store.find_condition(9).unwrap().operator, "Equal");
    }
}
