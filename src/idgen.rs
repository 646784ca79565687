use std::collections::HashMap;

use regex::Regex;

use crate::model::TaskNodeModel;

/// Per node type counters producing `{type}_{n}` node ids.
#[derive(Debug, Clone, Default)]
pub struct TaskIdGenerator {
    counters: HashMap<String, u64>,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator seeded from the ids already present in `nodes`.
    pub fn from_nodes(nodes: &[TaskNodeModel]) -> Self {
        let mut generator = Self::new();
        generator.init_from_nodes(nodes);
        generator
    }

    /// Raises each type's counter to the highest `{type}_{n}` found among
    /// the node ids, where the type is `nodeType` or, when that is empty,
    /// the meta `value`. Counters never go down.
    pub fn init_from_nodes(
        &mut self,
        nodes: &[TaskNodeModel],
    ) {
        let mut patterns: HashMap<&str, Option<Regex>> = HashMap::new();
        for node in nodes {
            let Some(node_type) = [node.data.node_type.as_str(), node.data.meta.value.as_str()].into_iter().find(|t| !t.is_empty()) else {
                continue;
            };
            let pattern = patterns.entry(node_type).or_insert_with(|| Regex::new(&format!(r"^{}_(\d+)$", regex::escape(node_type))).ok());
            let Some(n) = pattern.as_ref().and_then(|re| re.captures(&node.id)).and_then(|caps| caps[1].parse::<u64>().ok()) else {
                continue;
            };

            let counter = self.counters.entry(node_type.to_string()).or_insert(0);
            if n > *counter {
                *counter = n;
            }
        }
    }

    pub fn next(
        &mut self,
        node_type: &str,
    ) -> u64 {
        let counter = self.counters.entry(node_type.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn next_id(
        &mut self,
        node_type: &str,
    ) -> String {
        let n = self.next(node_type);
        Self::format_id(node_type, n)
    }

    pub fn format_id(
        node_type: &str,
        n: u64,
    ) -> String {
        format!("{}_{}", node_type, n)
    }

    /// Last number handed out for `node_type`, 0 when none.
    pub fn current(
        &self,
        node_type: &str,
    ) -> u64 {
        self.counters.get(node_type).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(
        id: &str,
        node_type: &str,
    ) -> TaskNodeModel {
        TaskNodeModel::new(id, node_type)
    }

    #[test]
    fn test_seed_from_existing_ids() {
        let nodes = vec![node("Task_1", "Task"), node("Task_3", "Task"), node("Other_5", "Other")];
        let mut generator = TaskIdGenerator::from_nodes(&nodes);

        assert_eq!(generator.next("Task"), 4);
        assert_eq!(generator.next("Other"), 6);

        generator.reset();
        assert_eq!(generator.next("Task"), 1);
    }

    #[test]
    fn test_next_id_format() {
        let mut generator = TaskIdGenerator::new();
        assert_eq!(generator.next_id("Reward"), "Reward_1");
        assert_eq!(generator.next_id("Reward"), "Reward_2");
        assert_eq!(generator.current("Reward"), 2);
        assert_eq!(generator.current("Task"), 0);
    }

    #[test]
    fn test_ignores_foreign_ids() {
        let nodes = vec![node("Task_7", "Other"), node("Task_x", "Task"), node("Task_2_1", "Task"), node("uuid-1", "")];
        let mut generator = TaskIdGenerator::from_nodes(&nodes);
        assert_eq!(generator.next("Task"), 1);
        assert_eq!(generator.next("Other"), 1);
    }

    #[test]
    fn test_meta_value_stands_in_for_missing_node_type() {
        let mut untyped = node("Task_2", "");
        untyped.data.meta.value = "Task".to_string();
        let mut generator = TaskIdGenerator::from_nodes(&[node("Task_1", "Task"), untyped]);
        assert_eq!(generator.next_id("Task"), "Task_3");
    }

    #[test]
    fn test_type_with_regex_chars() {
        let nodes = vec![node("A.B_4", "A.B"), node("AxB_9", "A.B")];
        let mut generator = TaskIdGenerator::from_nodes(&nodes);
        assert_eq!(generator.next("A.B"), 5);
    }

    #[test]
    fn test_init_never_lowers_counter() {
        let mut generator = TaskIdGenerator::new();
        for _ in 0..10 {
            generator.next("Task");
        }
        generator.init_from_nodes(&[node("Task_2", "Task")]);
        assert_eq!(generator.next("Task"), 11);
    }
}
