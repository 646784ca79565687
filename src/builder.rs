use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, Designer, Result, StoreType,
    store::{DbStore, MemStore, PostgresStore, Store},
};

pub struct DesignerBuilder {
    config: Config,
    async_worker_thread_number: u16,
    rt: Option<Arc<Runtime>>,
}

impl Default for DesignerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            async_worker_thread_number: 2,
            rt: None,
        }
    }
}

impl DesignerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.async_worker_thread_number = n;
        self
    }

    /// Runtime for the postgres client. One is created when needed.
    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    /// Opens the configured store and loads the metadata catalog.
    pub fn build(&self) -> Result<Designer> {
        let store = Store::new();
        let runtime = match self.config.store.store_type {
            StoreType::Mem => {
                MemStore::new().init(&store)?;
                None
            }
            StoreType::Postgres => {
                let url = self.config.postgres_url()?;
                let runtime = match &self.rt {
                    Some(rt) => rt.clone(),
                    None => Arc::new(Builder::new_multi_thread().worker_threads(self.async_worker_thread_number.into()).enable_all().build()?),
                };
                PostgresStore::new(url, runtime.clone())?.init(&store)?;
                Some(runtime)
            }
        };

        let designer = Designer::new(self.config.clone(), Arc::new(store), runtime);
        designer.refresh_catalog()?;
        Ok(designer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskflowError;

    #[test]
    fn test_build_mem_designer() {
        let designer = DesignerBuilder::new().build().unwrap();
        assert_eq!(designer.catalog().snapshot().version, 1);
        assert!(designer.list_templates(None).unwrap().is_empty());
    }

    #[test]
    fn test_postgres_without_url_is_config_error() {
        let config = Config::load_from_str("[store]\nstore_type = \"postgres\"\n").unwrap();
        let result = DesignerBuilder::new().config(config).build();
        assert!(matches!(result, Err(TaskflowError::Config(_))));
    }
}
