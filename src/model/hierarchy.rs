//! Parent/child structure of a node list.
//!
//! Parents are resolved from `parentId` (node id) first and fall back to
//! `parentTaskId` (business key). A node whose parent cannot be resolved,
//! or who names itself, is a root.

use std::collections::{HashMap, HashSet};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::Dfs,
};

use crate::model::TaskNodeModel;

pub struct Hierarchy {
    /// Node weights are indexes into the node slice the hierarchy was built from.
    graph: DiGraph<usize, ()>,
    parents: Vec<Option<usize>>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    pub fn build(nodes: &[TaskNodeModel]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        let mut by_task_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter().enumerate() {
            graph.add_node(idx);
            index.entry(node.id.clone()).or_insert(idx);
            if !node.data.task_id.is_empty() {
                by_task_id.entry(node.data.task_id.as_str()).or_insert(idx);
            }
        }

        let parents: Vec<Option<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let by_id = Some(node.data.parent_id.as_str()).filter(|p| !p.is_empty()).and_then(|p| index.get(p).copied());
                let by_task = || Some(node.data.parent_task_id.as_str()).filter(|p| !p.is_empty()).and_then(|p| by_task_id.get(p).copied());
                by_id.or_else(by_task).filter(|parent| *parent != idx)
            })
            .collect();

        for (idx, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                graph.add_edge(NodeIndex::new(*parent), NodeIndex::new(idx), ());
            }
        }

        Self {
            graph,
            parents,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn index_of(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn parent(
        &self,
        idx: usize,
    ) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }

    /// Direct children in node order.
    pub fn children(
        &self,
        idx: usize,
    ) -> Vec<usize> {
        if idx >= self.len() {
            return Vec::new();
        }
        let mut children: Vec<usize> = self.graph.neighbors_directed(NodeIndex::new(idx), Direction::Outgoing).map(|n| self.graph[n]).collect();
        children.sort_unstable();
        children
    }

    pub fn roots(&self) -> Vec<usize> {
        (0..self.len()).filter(|idx| self.parents[*idx].is_none()).collect()
    }

    /// Every node below `idx`, each reported once even when the parent
    /// pointers loop back.
    pub fn descendants(
        &self,
        idx: usize,
    ) -> Vec<usize> {
        if idx >= self.len() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut dfs = Dfs::new(&self.graph, NodeIndex::new(idx));
        while let Some(nx) = dfs.next(&self.graph) {
            let node = self.graph[nx];
            if node != idx {
                out.push(node);
            }
        }
        out
    }

    /// Nodes hidden beneath a collapsed ancestor.
    pub fn hidden_ids(
        &self,
        nodes: &[TaskNodeModel],
    ) -> HashSet<usize> {
        nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.data.collapsed)
            .flat_map(|(idx, _)| self.descendants(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(
        id: &str,
        parent: &str,
    ) -> TaskNodeModel {
        TaskNodeModel::new(id, "Task").with_parent(parent)
    }

    #[test]
    fn test_resolve_by_task_id() {
        let nodes = vec![node("a", ""), node("b", "a"), node("c", "a"), node("d", "b")];
        let h = Hierarchy::build(&nodes);

        assert_eq!(h.roots(), vec![0]);
        assert_eq!(h.children(0), vec![1, 2]);
        assert_eq!(h.parent(3), Some(1));
        assert_eq!(h.descendants(0).len(), 3);
    }

    #[test]
    fn test_parent_id_wins_over_task_id() {
        let mut nodes = vec![node("a", ""), node("b", ""), node("c", "a")];
        nodes[2].data.parent_id = "b".into();
        let h = Hierarchy::build(&nodes);

        assert_eq!(h.parent(2), Some(1));
        assert_eq!(h.roots(), vec![0, 1]);
    }

    #[test]
    fn test_missing_and_self_parent_are_roots() {
        let nodes = vec![node("a", "ghost"), node("b", "b")];
        let h = Hierarchy::build(&nodes);

        assert_eq!(h.roots(), vec![0, 1]);
        assert!(h.children(1).is_empty());
    }

    #[test]
    fn test_descendants_terminate_on_cycle() {
        let nodes = vec![node("a", "c"), node("b", "a"), node("c", "b")];
        let h = Hierarchy::build(&nodes);

        assert!(h.roots().is_empty());
        let mut desc = h.descendants(0);
        desc.sort();
        assert_eq!(desc, vec![1, 2]);
    }

    #[test]
    fn test_hidden_below_collapsed() {
        let mut nodes = vec![node("a", ""), node("b", "a"), node("c", "b"), node("d", "")];
        nodes[1].data.collapsed = true;
        let h = Hierarchy::build(&nodes);

        let hidden = h.hidden_ids(&nodes);
        assert_eq!(hidden, HashSet::from([2]));
    }
}
