//! Headless editing session over one task flow.
//!
//! Mirrors the canvas operations of the designer: adding, deleting and
//! connecting nodes, collapsing subtrees, importing templates and
//! validating. Every operation is synchronous and leaves the session
//! untouched when it fails.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::{
    Result, TaskflowError,
    check::{CheckReport, Checker},
    idgen::TaskIdGenerator,
    layout::TreeLayout,
    model::{DEFAULT_NODE_KIND, Position, TaskData, TaskEdgeModel, TaskFlowModel, TaskMeta, TaskNodeModel},
};

/// Node type used when a task is added without metadata.
pub const DEFAULT_TASK_TYPE: &str = "Task";

/// Offset applied to template nodes so they do not cover existing ones.
const IMPORT_OFFSET: f64 = 100.0;

/// Type a copied template node is numbered under.
fn id_type(node: &TaskNodeModel) -> &str {
    [node.data.node_type.as_str(), node.data.meta.value.as_str()].into_iter().find(|t| !t.is_empty()).unwrap_or(DEFAULT_TASK_TYPE)
}

pub struct FlowEditor {
    nodes: Vec<TaskNodeModel>,
    edges: Vec<TaskEdgeModel>,
    selected: Option<String>,
    idgen: TaskIdGenerator,
    layout: TreeLayout,
    report: CheckReport,
}

impl Default for FlowEditor {
    fn default() -> Self {
        Self::new(TreeLayout::default())
    }
}

impl FlowEditor {
    pub fn new(layout: TreeLayout) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            selected: None,
            idgen: TaskIdGenerator::new(),
            layout,
            report: CheckReport::default(),
        }
    }

    /// Opens an existing flow. Id counters continue after the ids in use.
    pub fn open(
        flow: &TaskFlowModel,
        layout: TreeLayout,
    ) -> Self {
        Self {
            nodes: flow.nodes.clone(),
            edges: flow.edges.clone(),
            selected: None,
            idgen: TaskIdGenerator::from_nodes(&flow.nodes),
            layout,
            report: CheckReport::default(),
        }
    }

    pub fn nodes(&self) -> &[TaskNodeModel] {
        &self.nodes
    }

    pub fn edges(&self) -> &[TaskEdgeModel] {
        &self.edges
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<&TaskNodeModel> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Result of the last [`validate`](Self::validate) call.
    pub fn report(&self) -> &CheckReport {
        &self.report
    }

    fn require(
        &self,
        id: &str,
    ) -> Result<&TaskNodeModel> {
        self.node(id).ok_or_else(|| TaskflowError::NotFound(format!("node '{}'", id)))
    }

    /// Adds a task under `parent`, or under the selected node when no
    /// parent is given, and selects it. Returns the new node id.
    pub fn add_task(
        &mut self,
        parent: Option<&str>,
        meta: Option<TaskMeta>,
    ) -> Result<String> {
        let meta = meta.unwrap_or_else(|| TaskMeta {
            desc: Some("default sub task".to_string()),
            ..TaskMeta::new(DEFAULT_TASK_TYPE)
        });
        let node_type = if meta.value.is_empty() {
            DEFAULT_TASK_TYPE.to_string()
        } else {
            meta.value.clone()
        };

        let parent = match parent.map(String::from).or_else(|| self.selected.clone()) {
            Some(parent_id) => {
                let parent = self.require(&parent_id)?;
                Some((parent.id.clone(), parent.data.task_id.clone()))
            }
            None => None,
        };

        let incr = self.idgen.next(&node_type);
        let id = TaskIdGenerator::format_id(&node_type, incr);
        let (parent_id, parent_task_id) = parent.clone().unwrap_or_default();

        let node = TaskNodeModel {
            id: id.clone(),
            kind: DEFAULT_NODE_KIND.to_string(),
            position: Position::new(100.0, 100.0),
            data: TaskData {
                label: format!("{}_{}", meta.kind.as_deref().unwrap_or(DEFAULT_TASK_TYPE), incr),
                parent_id,
                parent_task_id,
                task_id: id.clone(),
                node_type,
                target_process: Some(0),
                weight: Some(0),
                sort_id: Some(0),
                time_type: Some(0),
                start_time: "2025-06-01".to_string(),
                end_time: "2025-06-15".to_string(),
                offset_time: Some(0),
                meta,
                ..Default::default()
            },
            ..Default::default()
        };

        debug!("editor::add_task({}) parent={:?}", id, parent.as_ref().map(|p| &p.0));
        self.nodes.push(node);
        if let Some((parent_id, _)) = parent {
            self.edges.push(TaskEdgeModel::link(parent_id, id.clone()));
        }
        self.relayout();
        self.selected = Some(id.clone());

        Ok(id)
    }

    /// Removes a node and every edge touching it. Its children stay and
    /// become roots.
    pub fn delete_node(
        &mut self,
        id: &str,
    ) -> Result<()> {
        self.require(id)?;
        debug!("editor::delete_node({})", id);

        self.edges.retain(|e| !e.touches(id));
        self.nodes.retain(|n| n.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.relayout();
        Ok(())
    }

    /// Draws an edge and makes `source` the parent of `target`. Positions
    /// are left alone.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<()> {
        if source == target {
            return Err(TaskflowError::Node(format!("cannot connect node '{}' to itself", source)));
        }
        let source_task_id = self.require(source)?.data.task_id.clone();
        self.require(target)?;
        debug!("editor::connect({} -> {})", source, target);

        self.edges.push(TaskEdgeModel::link(source, target));
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == target) {
            node.data.parent_id = source.to_string();
            node.data.parent_task_id = source_task_id;
        }
        Ok(())
    }

    pub fn select(
        &mut self,
        id: Option<&str>,
    ) -> Result<()> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.selected = id.map(String::from);
        Ok(())
    }

    /// Flips the collapsed state of a node and lays the visible nodes out
    /// again. Returns the new state.
    pub fn toggle_collapse(
        &mut self,
        id: &str,
    ) -> Result<bool> {
        self.require(id)?;
        let mut collapsed = false;
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.data.collapsed = !node.data.collapsed;
            collapsed = node.data.collapsed;
        }
        debug!("editor::toggle_collapse({}) collapsed={}", id, collapsed);
        self.relayout();
        Ok(collapsed)
    }

    /// Inserts a copy of `template` with fresh ids. Template roots are
    /// attached below the selected node when there is one. Returns the new
    /// node ids in template order.
    pub fn import_template(
        &mut self,
        template: &TaskFlowModel,
    ) -> Result<Vec<String>> {
        if template.nodes.is_empty() {
            return Err(TaskflowError::Flow(format!("template '{}' has no nodes", template.id)));
        }

        let mut by_node_id: HashMap<&str, String> = HashMap::new();
        let mut by_task_id: HashMap<&str, String> = HashMap::new();
        for node in &template.nodes {
            let new_id = self.idgen.next_id(id_type(node));
            by_node_id.insert(node.id.as_str(), new_id.clone());
            if !node.data.task_id.is_empty() {
                by_task_id.entry(node.data.task_id.as_str()).or_insert(new_id);
            }
        }

        let attach = match &self.selected {
            Some(selected) => {
                let node = self.require(selected)?;
                Some((node.id.clone(), node.data.task_id.clone()))
            }
            None => None,
        };
        let template_root = template.nodes.iter().find(|n| n.data.parent_task_id.is_empty() && n.data.parent_id.is_empty());

        let mut new_ids = Vec::with_capacity(template.nodes.len());
        let mut new_nodes = Vec::with_capacity(template.nodes.len());
        for node in &template.nodes {
            let new_id = by_node_id.get(node.id.as_str()).cloned().unwrap_or_default();
            let parent = Some(node.data.parent_task_id.as_str())
                .filter(|p| !p.is_empty())
                .and_then(|p| by_task_id.get(p).or_else(|| by_node_id.get(p)))
                .or_else(|| Some(node.data.parent_id.as_str()).filter(|p| !p.is_empty()).and_then(|p| by_node_id.get(p)));

            let mut copy = node.clone();
            copy.id = new_id.clone();
            copy.position = Position::new(node.position.x + IMPORT_OFFSET, node.position.y + IMPORT_OFFSET);
            copy.data.task_id = new_id.clone();
            if copy.data.node_type.is_empty() {
                copy.data.node_type = id_type(node).to_string();
            }
            match (parent, &attach) {
                (Some(parent), _) => {
                    copy.data.parent_id = parent.clone();
                    copy.data.parent_task_id = parent.clone();
                }
                (None, Some((attach_id, attach_task_id))) => {
                    copy.data.parent_id = attach_id.clone();
                    copy.data.parent_task_id = attach_task_id.clone();
                }
                (None, None) => {
                    copy.data.parent_id.clear();
                    copy.data.parent_task_id.clear();
                }
            }
            new_ids.push(new_id);
            new_nodes.push(copy);
        }

        let mut new_edges: Vec<TaskEdgeModel> = template
            .edges
            .iter()
            .filter_map(|edge| {
                let source = by_node_id.get(edge.source.as_str())?;
                let target = by_node_id.get(edge.target.as_str())?;
                Some(TaskEdgeModel {
                    kind: edge.kind.clone(),
                    ..TaskEdgeModel::link(source.clone(), target.clone())
                })
            })
            .collect();
        if let (Some((attach_id, _)), Some(root)) = (&attach, template_root) {
            if let Some(root_id) = by_node_id.get(root.id.as_str()) {
                new_edges.push(TaskEdgeModel::link(attach_id.clone(), root_id.clone()));
            }
        }

        debug!("editor::import_template({}) nodes={} attached={}", template.id, new_nodes.len(), attach.is_some());
        self.nodes.extend(new_nodes);
        self.edges.extend(new_edges);
        self.relayout();

        Ok(new_ids)
    }

    pub fn relayout(&mut self) {
        self.nodes = self.layout.layout(&self.nodes);
    }

    /// Clears the canvas, the selection and every id counter.
    pub fn reset(&mut self) {
        debug!("editor::reset");
        self.nodes.clear();
        self.edges.clear();
        self.selected = None;
        self.idgen.reset();
        self.report = CheckReport::default();
    }

    pub fn validate(
        &mut self,
        checker: &Checker,
    ) -> &CheckReport {
        self.report = checker.check_all(&self.nodes);
        &self.report
    }

    /// Ids to highlight for the selected node's findings.
    pub fn highlighted(&self) -> Vec<String> {
        self.selected.as_deref().map(|id| self.report.related_ids(id)).unwrap_or_default()
    }

    /// Snapshot of the canvas as a template ready to save.
    pub fn to_template(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TaskFlowModel> {
        if title.trim().is_empty() {
            return Err(TaskflowError::Flow("template title is required".into()));
        }
        let flow = TaskFlowModel {
            id: format!("tmpl_{}", Uuid::new_v4()),
            title: title.to_string(),
            description: description.to_string(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        };
        Ok(flow.for_save())
    }
}
