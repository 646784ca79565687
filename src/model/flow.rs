use serde::{Deserialize, Serialize};

use crate::{
    Result, TaskflowError,
    model::{TaskEdgeModel, TaskNodeModel},
};

/// A named task graph, saved as a reusable template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFlowModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<TaskNodeModel>,
    #[serde(default)]
    pub edges: Vec<TaskEdgeModel>,
}

impl TaskFlowModel {
    /// Parses a saved template or a bare `{ "nodes": [], "edges": [] }` export.
    pub fn from_json(s: &str) -> Result<Self> {
        let flow = serde_json::from_str::<TaskFlowModel>(s);
        match flow {
            Ok(v) => Ok(v),
            Err(e) => Err(TaskflowError::Flow(format!("{}", e))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy fit for persistence: transient canvas state dropped, blank
    /// task ids filled from the node id.
    pub fn for_save(&self) -> Self {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                node.hidden = false;
                node.data.collapsed = false;
                if node.data.task_id.trim().is_empty() {
                    node.data.task_id = node.id.clone();
                }
                node
            })
            .collect();

        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            nodes,
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_bare_export() {
        let flow = TaskFlowModel::from_json(r#"{"nodes":[{"id":"Task_1","data":{"taskId":"Task_1"}}],"edges":[]}"#).unwrap();
        assert_eq!(flow.id, "");
        assert_eq!(flow.nodes.len(), 1);
        assert_eq!(flow.nodes[0].data.task_id, "Task_1");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = TaskFlowModel::from_json("{\"nodes\": 1}").unwrap_err();
        assert!(matches!(err, TaskflowError::Flow(_)));
    }

    #[test]
    fn test_for_save_strips_transient_state() {
        let mut node = TaskNodeModel::new("Task_1", "Task");
        node.hidden = true;
        node.data.collapsed = true;
        node.data.task_id.clear();
        let flow = TaskFlowModel {
            nodes: vec![node],
            ..Default::default()
        };

        let saved = flow.for_save();
        assert!(!saved.nodes[0].hidden);
        assert!(!saved.nodes[0].data.collapsed);
        assert_eq!(saved.nodes[0].data.task_id, "Task_1");
    }
}
