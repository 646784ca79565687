use serde::{Deserialize, Serialize};

/// Canvas connection between two nodes.
///
/// Edges mirror `parentTaskId` / `promiseTaskId` for rendering only; the
/// node data stays authoritative for the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEdgeModel {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl TaskEdgeModel {
    /// Animated default edge with the editor's `edge-{source}-{target}` id.
    pub fn link(
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("edge-{}-{}", source, target),
            source,
            target,
            kind: Some("default".to_string()),
            animated: true,
        }
    }

    pub fn touches(
        &self,
        node_id: &str,
    ) -> bool {
        self.source == node_id || self.target == node_id
    }
}
