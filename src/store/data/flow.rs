use serde::{Deserialize, Serialize};

use crate::{
    model::{TaskEdgeModel, TaskFlowModel, TaskNodeModel},
    store::{DbCollectionIden, StoreIden},
};

/// A saved flow template.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TaskFlow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub nodes: Vec<TaskNodeModel>,
    pub edges: Vec<TaskEdgeModel>,
    pub create_time: i64,
    pub update_time: i64,
}

impl DbCollectionIden for TaskFlow {
    fn iden() -> StoreIden {
        StoreIden::TaskFlows
    }
}

impl TaskFlow {
    pub fn model(&self) -> TaskFlowModel {
        TaskFlowModel {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}
