use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use crate::{
    Result,
    store::{DbCollection, DbStore, Store, data::*, map_db_err},
};

use super::{DbInit, collection::*, synclient::SynClient};

pub struct PostgresStore {
    flows: Arc<FlowCollection>,
    task_types: Arc<TaskTypeCollection>,
    conditions: Arc<ConditionCollection>,
}

impl DbStore for PostgresStore {
    fn init(
        &self,
        s: &Store,
    ) -> Result<()> {
        self.flows.init()?;
        self.task_types.init()?;
        self.conditions.init()?;

        s.register(self.flows())?;
        s.register(self.task_types())?;
        s.register(self.conditions())?;
        info!("postgres store initialized");
        Ok(())
    }
}

impl PostgresStore {
    /// Connects to `db_url`. Tables are created by [`DbStore::init`].
    pub fn new(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let conn = Arc::new(SynClient::connect(db_url, runtime).map_err(map_db_err)?);

        Ok(Self {
            flows: Arc::new(FlowCollection::new(&conn)),
            task_types: Arc::new(TaskTypeCollection::new(&conn)),
            conditions: Arc::new(ConditionCollection::new(&conn)),
        })
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
