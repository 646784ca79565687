//! Shared task type and condition catalog.
//!
//! Readers either take a [`CatalogSnapshot`], fixed at the time it was
//! taken, or hold a [`CatalogHandle`] whose every read sees the latest
//! refresh.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::{
    Result,
    model::TaskMeta,
    store::{
        Store,
        data::{TaskCondition, TaskType},
    },
};

/// Immutable catalog contents of one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    /// Incremented on every successful refresh, 0 before the first.
    pub version: u64,
    pub task_types: Vec<TaskType>,
    pub conditions: Vec<TaskCondition>,
}

impl CatalogSnapshot {
    pub fn task_type(
        &self,
        value: &str,
    ) -> Option<&TaskType> {
        self.task_types.iter().find(|t| t.value == value)
    }

    /// Metadata to attach to a node of type `value`.
    pub fn task_meta(
        &self,
        value: &str,
    ) -> Option<TaskMeta> {
        self.task_type(value).map(TaskType::to_meta)
    }

    pub fn condition(
        &self,
        id: i64,
    ) -> Option<&TaskCondition> {
        self.conditions.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MetaCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl MetaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Handle reading through to the latest snapshot.
    pub fn live(self: &Arc<Self>) -> CatalogHandle {
        CatalogHandle(self.clone())
    }

    /// Swaps in new contents and returns the resulting snapshot.
    pub fn replace(
        &self,
        task_types: Vec<TaskType>,
        conditions: Vec<TaskCondition>,
    ) -> Arc<CatalogSnapshot> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = Arc::new(CatalogSnapshot {
            version: current.version + 1,
            task_types,
            conditions,
        });
        *current = next.clone();
        next
    }

    /// Reloads both collections from `store`. On failure the previous
    /// snapshot stays in place.
    pub fn refresh(
        &self,
        store: &Store,
    ) -> Result<Arc<CatalogSnapshot>> {
        let loaded = store.all_task_types().and_then(|types| Ok((types, store.all_conditions()?)));
        match loaded {
            Ok((task_types, conditions)) => {
                let snapshot = self.replace(task_types, conditions);
                info!("catalog refreshed: {} task types, {} conditions (v{})", snapshot.task_types.len(), snapshot.conditions.len(), snapshot.version);
                Ok(snapshot)
            }
            Err(err) => {
                warn!("catalog refresh failed, keeping v{}: {}", self.snapshot().version, err);
                Err(err)
            }
        }
    }
}

/// Cloneable reader that always sees the newest catalog contents.
#[derive(Debug, Clone)]
pub struct CatalogHandle(Arc<MetaCatalog>);

impl CatalogHandle {
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.0.snapshot()
    }

    pub fn task_meta(
        &self,
        value: &str,
    ) -> Option<TaskMeta> {
        self.0.snapshot().task_meta(value)
    }

    pub fn condition(
        &self,
        id: i64,
    ) -> Option<TaskCondition> {
        self.0.snapshot().condition(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DbStore, MemStore};

    #[test]
    fn test_snapshot_is_fixed_and_handle_is_live() {
        let catalog = Arc::new(MetaCatalog::new());
        let handle = catalog.live();
        let before = catalog.snapshot();
        assert_eq!(before.version, 0);
        assert!(handle.task_meta("Task").is_none());

        catalog.replace(vec![TaskType::new("Task")], vec![]);
        assert!(before.task_type("Task").is_none());
        assert_eq!(handle.task_meta("Task").unwrap().value, "Task");
        assert_eq!(handle.snapshot().version, 1);
    }

    #[test]
    fn test_refresh_from_store() {
        let store = Store::new();
        MemStore::new().init(&store).unwrap();
        store.task_types().unwrap().create(&TaskType::new("Group")).unwrap();
        store
            .conditions()
            .unwrap()
            .create(&TaskCondition {
                id: 3,
                operator: "Equal".into(),
                ..Default::default()
            })
            .unwrap();

        let catalog = MetaCatalog::new();
        let snapshot = catalog.refresh(&store).unwrap();
        assert_eq!(snapshot.task_types.len(), 1);
        assert_eq!(snapshot.condition(3).map(|c| c.operator.as_str()), Some("Equal"));
    }

    #[test]
    fn test_failed_refresh_keeps_previous() {
        let catalog = MetaCatalog::new();
        catalog.replace(vec![TaskType::new("Task")], vec![]);

        // no collections registered
        let empty = Store::new();
        assert!(catalog.refresh(&empty).is_err());
        assert_eq!(catalog.snapshot().version, 1);
        assert!(catalog.snapshot().task_type("Task").is_some());
    }
}
