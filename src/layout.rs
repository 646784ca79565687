//! Pyramid auto-layout of the task tree.
//!
//! Leaves take one `gap_x` slot, a parent sits centered over the span of
//! its children and every depth is `gap_y` lower than the previous one.
//! Root subtrees are placed left to right with one extra gap between them.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
    LayoutConfig,
    model::{Hierarchy, Position, TaskNodeModel},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeLayout {
    pub gap_x: f64,
    pub gap_y: f64,
}

impl Default for TreeLayout {
    fn default() -> Self {
        LayoutConfig::default().into()
    }
}

impl From<LayoutConfig> for TreeLayout {
    fn from(config: LayoutConfig) -> Self {
        Self {
            gap_x: config.gap_x,
            gap_y: config.gap_y,
        }
    }
}

enum Visit {
    Enter(usize),
    Exit(usize),
}

/// Per-pass bookkeeping, indexed like the node slice.
struct Measure {
    claimed: Vec<bool>,
    has_children: Vec<bool>,
    /// Children this node owns in the layout, repeats removed.
    owned: Vec<Vec<usize>>,
    width: Vec<f64>,
}

impl TreeLayout {
    pub fn new(
        gap_x: f64,
        gap_y: f64,
    ) -> Self {
        Self {
            gap_x,
            gap_y,
        }
    }

    /// Returns a copy of `nodes` with fresh positions for every visible
    /// node. Nodes below a collapsed ancestor keep their position and get
    /// the `hidden` flag.
    pub fn layout(
        &self,
        nodes: &[TaskNodeModel],
    ) -> Vec<TaskNodeModel> {
        let hierarchy = Hierarchy::build(nodes);
        let hidden = hierarchy.hidden_ids(nodes);
        let n = nodes.len();

        let mut m = Measure {
            claimed: vec![false; n],
            has_children: vec![false; n],
            owned: vec![Vec::new(); n],
            width: vec![0.0; n],
        };
        let mut positions: Vec<Option<Position>> = vec![None; n];

        // proper roots first, then whatever a parent loop left unreachable
        let mut starts: Vec<usize> = hierarchy.roots().into_iter().filter(|idx| !hidden.contains(idx)).collect();
        let extra_from = starts.len();
        starts.extend(0..n);

        let mut cursor = 0.0;
        for (i, root) in starts.into_iter().enumerate() {
            if m.claimed[root] || hidden.contains(&root) {
                continue;
            }
            if i >= extra_from {
                warn!("node '{}' is not reachable from a root, laying it out as one", nodes[root].id);
            }
            self.measure(root, &hierarchy, nodes, &hidden, &mut m);
            self.place(root, cursor, &m, &mut positions);
            cursor += m.width[root] + self.gap_x;
        }

        debug!("layout placed {} of {} nodes", positions.iter().filter(|p| p.is_some()).count(), n);

        nodes
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(idx, (node, position))| {
                let mut node = node.clone();
                node.hidden = hidden.contains(&idx);
                if let Some(position) = position {
                    node.position = position;
                }
                node
            })
            .collect()
    }

    /// Post-order width pass. A node reached a second time contributes no width.
    fn measure(
        &self,
        root: usize,
        hierarchy: &Hierarchy,
        nodes: &[TaskNodeModel],
        hidden: &HashSet<usize>,
        m: &mut Measure,
    ) {
        m.claimed[root] = true;
        let mut stack = vec![Visit::Enter(root)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(idx) => {
                    let children: Vec<usize> = hierarchy.children(idx).into_iter().filter(|c| !hidden.contains(c)).collect();
                    m.has_children[idx] = !children.is_empty();

                    let mut owned = Vec::with_capacity(children.len());
                    for child in children {
                        if m.claimed[child] {
                            warn!("node '{}' repeats under '{}', parent loop detected", nodes[child].id, nodes[idx].id);
                            continue;
                        }
                        m.claimed[child] = true;
                        owned.push(child);
                    }

                    stack.push(Visit::Exit(idx));
                    stack.extend(owned.iter().rev().map(|c| Visit::Enter(*c)));
                    m.owned[idx] = owned;
                }
                Visit::Exit(idx) => {
                    m.width[idx] = if m.has_children[idx] {
                        m.owned[idx].iter().map(|c| m.width[*c]).sum()
                    } else {
                        self.gap_x
                    };
                }
            }
        }
    }

    /// Pre-order position pass over the owned children measured before.
    fn place(
        &self,
        root: usize,
        start: f64,
        m: &Measure,
        positions: &mut [Option<Position>],
    ) {
        let mut stack = vec![(root, start, 0usize)];

        while let Some((idx, start, depth)) = stack.pop() {
            let x = if m.has_children[idx] {
                start + m.width[idx] / 2.0 - self.gap_x / 2.0
            } else {
                start
            };
            positions[idx] = Some(Position::new(x, depth as f64 * self.gap_y));

            let mut child_start = start;
            let mut frames = Vec::with_capacity(m.owned[idx].len());
            for child in &m.owned[idx] {
                frames.push((*child, child_start, depth + 1));
                child_start += m.width[*child];
            }
            stack.extend(frames.into_iter().rev());
        }
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

    fn pos(
        nodes: &[TaskNodeModel],
        id: &str,
    ) -> (f64, f64) {
        let node = nodes.iter().find(|n| n.id == id).unwrap();
        (node.position.x, node.position.y)
    }

    #[test]
    fn test_single_leaf_at_origin() {
        let out = TreeLayout::default().layout(&[node("a", "")]);
        assert_eq!(pos(&out, "a"), (0.0, 0.0));
    }

    #[test]
    fn test_parent_centered_over_children() {
        let nodes = vec![node("r", ""), node("a", "r"), node("b", "r")];
        let out = TreeLayout::default().layout(&nodes);

        assert_eq!(pos(&out, "a"), (0.0, 220.0));
        assert_eq!(pos(&out, "b"), (280.0, 220.0));
        assert_eq!(pos(&out, "r"), (140.0, 0.0));
    }

    #[test]
    fn test_roots_left_to_right() {
        let nodes = vec![node("r1", ""), node("r2", ""), node("c", "r2"), node("d", "r2")];
        let out = TreeLayout::new(100.0, 50.0).layout(&nodes);

        assert_eq!(pos(&out, "r1"), (0.0, 0.0));
        // r1 width 100 plus one gap
        assert_eq!(pos(&out, "c"), (200.0, 50.0));
        assert_eq!(pos(&out, "d"), (300.0, 50.0));
        assert_eq!(pos(&out, "r2"), (250.0, 0.0));
    }

    #[test]
    fn test_layout_is_idempotent() {
        let nodes = vec![node("r", ""), node("a", "r"), node("b", "a"), node("c", "a"), node("x", "")];
        let layout = TreeLayout::default();
        let once = layout.layout(&nodes);
        let twice = layout.layout(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_parent_is_root() {
        let nodes = vec![node("r", ""), node("orphan", "ghost")];
        let out = TreeLayout::default().layout(&nodes);
        assert_eq!(pos(&out, "orphan"), (560.0, 0.0));
    }

    #[test]
    fn test_cycle_terminates() {
        let nodes = vec![node("a", "c"), node("b", "a"), node("c", "b"), node("r", "")];
        let out = TreeLayout::default().layout(&nodes);

        assert_eq!(pos(&out, "r"), (0.0, 0.0));
        assert_eq!(pos(&out, "a").1, 0.0);
        assert_eq!(pos(&out, "b").1, 220.0);
        assert_eq!(pos(&out, "c").1, 440.0);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut nodes = vec![node("n0", "")];
        for i in 1..20_000 {
            nodes.push(node(&format!("n{}", i), &format!("n{}", i - 1)));
        }
        let out = TreeLayout::default().layout(&nodes);
        assert_eq!(pos(&out, "n19999").1, 19_999.0 * 220.0);
    }

    #[test]
    fn test_collapsed_subtree_keeps_position() {
        let mut nodes = vec![node("r", ""), node("a", "r"), node("b", "r"), node("a1", "a"), node("a2", "a")];
        nodes[3].position = Position::new(-7.0, 9.0);
        nodes[1].data.collapsed = true;

        let out = TreeLayout::default().layout(&nodes);
        assert!(out[3].hidden && out[4].hidden);
        assert!(!out[1].hidden);
        assert_eq!(pos(&out, "a1"), (-7.0, 9.0));
        // a counts as a leaf while collapsed
        assert_eq!(pos(&out, "a"), (0.0, 220.0));
        assert_eq!(pos(&out, "b"), (280.0, 220.0));
    }
}
