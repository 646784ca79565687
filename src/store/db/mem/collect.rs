use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::{
    Result, ShareLock, TaskflowError,
    store::{DbCollection, PageData, query::Query},
};

use super::DbDocument;

/// Insertion ordered in-memory collection.
#[derive(Debug, Clone)]
pub struct Collect<T> {
    name: String,
    items: ShareLock<Vec<T>>,
}

impl<T> Collect<T>
where
    T: DbDocument + Clone,
{
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn lock_err(&self) -> TaskflowError {
        TaskflowError::Store(format!("collection {} lock poisoned", self.name))
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument + Clone + Send + Sync,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("{}::exists({})", self.name, id);
        let items = self.items.read().map_err(|_| self.lock_err())?;
        Ok(items.iter().any(|item| item.id() == id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        trace!("{}::find({})", self.name, id);
        let items = self.items.read().map_err(|_| self.lock_err())?;
        items.iter().find(|item| item.id() == id).cloned().ok_or_else(|| TaskflowError::NotFound(format!("{} '{}'", self.name, id)))
    }

    fn query(
        &self,
        q: &Query,
    ) -> Result<PageData<Self::Item>> {
        trace!("{}::query({:?})", self.name, q);
        let items = self.items.read().map_err(|_| self.lock_err())?;

        let mut matched = Vec::new();
        for item in items.iter() {
            let doc = item.doc()?;
            if q.is_match(&doc) {
                matched.push((doc, item));
            }
        }
        if !q.order_by().is_empty() {
            matched.sort_by(|a, b| q.compare(&a.0, &b.0));
        }

        let count = matched.len();
        let rows = matched.into_iter().skip(q.offset()).take(q.limit()).map(|(_, item)| item.clone()).collect();
        Ok(PageData {
            count,
            page_num: q.offset() / q.limit() + 1,
            page_count: count.div_ceil(q.limit()),
            page_size: q.limit(),
            rows,
        })
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::create({})", self.name, data.id());
        let mut items = self.items.write().map_err(|_| self.lock_err())?;
        let id = data.id();
        if items.iter().any(|item| item.id() == id) {
            return Err(TaskflowError::Store(format!("{} '{}' already exists", self.name, id)));
        }
        items.push(data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::update({})", self.name, data.id());
        let mut items = self.items.write().map_err(|_| self.lock_err())?;
        let id = data.id();
        match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                *item = data.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("{}::delete({})", self.name, id);
        let mut items = self.items.write().map_err(|_| self.lock_err())?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        Ok(items.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{data::TaskCondition, query::Expr};

    fn condition(
        id: i64,
        operator: &str,
    ) -> TaskCondition {
        TaskCondition {
            id,
            operator: operator.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_crud() {
        let collect = Collect::<TaskCondition>::new("conditions");
        assert!(collect.create(&condition(1, "Equal")).unwrap());
        assert!(collect.create(&condition(1, "Equal")).is_err());
        assert!(collect.exists("1").unwrap());

        assert!(collect.update(&condition(1, "and")).unwrap());
        assert_eq!(collect.find("1").unwrap().operator, "and");
        assert!(!collect.update(&condition(2, "or")).unwrap());

        assert!(collect.delete("1").unwrap());
        assert!(!collect.delete("1").unwrap());
        assert!(matches!(collect.find("1"), Err(TaskflowError::NotFound(_))));
    }

    #[test]
    fn test_collect_query_pages() {
        let collect = Collect::<TaskCondition>::new("conditions");
        for id in [3, 1, 2, 5, 4] {
            collect.create(&condition(id, if id % 2 == 0 { "and" } else { "Equal" })).unwrap();
        }

        let all = collect.query(&Query::new()).unwrap();
        assert_eq!(all.rows.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 1, 2, 5, 4]);

        let page = collect.query(&Query::new().set_order("id", false).set_limit(2).set_offset(2)).unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.page_num, 2);
        assert_eq!(page.rows.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 4]);

        let groups = collect.query(&Query::new().filter(Expr::eq("operator", "and"))).unwrap();
        assert_eq!(groups.count, 2);
    }
}
