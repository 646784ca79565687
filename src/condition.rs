//! Condition operators and human readable rendering of condition trees.

use std::collections::HashSet;

use strum::{AsRefStr, EnumIter, EnumString};

use crate::store::data::TaskCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

impl ConditionOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ConditionOperator::Equal => "=",
            ConditionOperator::NotEqual => "!=",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterThanOrEqual => "≥",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessThanOrEqual => "≤",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "not in",
            ConditionOperator::And => "AND",
            ConditionOperator::Or => "OR",
        }
    }

    /// `and` / `or` combine sub conditions instead of comparing a field.
    pub fn is_group(&self) -> bool {
        matches!(self, ConditionOperator::And | ConditionOperator::Or)
    }
}

/// Sub condition ids of a group condition. Blank entries are skipped.
pub fn sub_condition_ids(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Renders the condition `id` and its sub conditions as indented lines.
///
/// Unknown ids render as `not found`; a condition that re-enters one of
/// its ancestors renders as a cycle and is not expanded again.
pub fn describe_condition<F>(
    lookup: F,
    id: &str,
) -> String
where
    F: Fn(i64) -> Option<TaskCondition>,
{
    let mut lines = Vec::new();
    let mut path = HashSet::new();
    describe(&lookup, id, 0, &mut path, &mut lines);
    lines.join("\n")
}

fn describe<F>(
    lookup: &F,
    id: &str,
    depth: usize,
    path: &mut HashSet<i64>,
    lines: &mut Vec<String>,
) where
    F: Fn(i64) -> Option<TaskCondition>,
{
    let indent = "  ".repeat(depth);
    let Some(condition) = id.trim().parse::<i64>().ok().and_then(lookup) else {
        lines.push(format!("{}#{}: not found", indent, id));
        return;
    };
    if !path.insert(condition.id) {
        lines.push(format!("{}#{}: cycle", indent, condition.id));
        return;
    }

    let operator = condition.operator.parse::<ConditionOperator>().ok();
    let symbol = operator.map(|op| op.symbol()).unwrap_or(condition.operator.as_str());
    if operator.is_some_and(|op| op.is_group()) {
        lines.push(format!("{}#{}: {} group", indent, condition.id, symbol));
        for sub in sub_condition_ids(&condition.value) {
            describe(lookup, &sub, depth + 1, path, lines);
        }
    } else {
        let field = if condition.condition_type.is_empty() {
            "field"
        } else {
            condition.condition_type.as_str()
        };
        lines.push(format!("{}#{}: {} {} {}", indent, condition.id, field, symbol, condition.value));
    }

    path.remove(&condition.id);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn condition(
        id: i64,
        operator: &str,
        condition_type: &str,
        value: &str,
    ) -> TaskCondition {
        TaskCondition {
            id,
            operator: operator.into(),
            condition_type: condition_type.into(),
            value: value.into(),
            desc: String::new(),
        }
    }

    fn lookup(conditions: Vec<TaskCondition>) -> impl Fn(i64) -> Option<TaskCondition> {
        let map: HashMap<i64, TaskCondition> = conditions.into_iter().map(|c| (c.id, c)).collect();
        move |id| map.get(&id).cloned()
    }

    #[test]
    fn test_operator_names() {
        assert_eq!("and".parse::<ConditionOperator>().unwrap(), ConditionOperator::And);
        assert_eq!("GreaterThanOrEqual".parse::<ConditionOperator>().unwrap().symbol(), "≥");
        assert_eq!(ConditionOperator::Or.as_ref(), "or");
        assert!("xor".parse::<ConditionOperator>().is_err());
    }

    #[test]
    fn test_describe_tree() {
        let find = lookup(vec![condition(1, "and", "", "2, 3,,"), condition(2, "GreaterThan", "level", "10"), condition(3, "Equal", "", "vip")]);

        let text = describe_condition(find, "1");
        assert_eq!(text, "#1: AND group\n  #2: level > 10\n  #3: field = vip");
    }

    #[test]
    fn test_describe_unknown_and_cycle() {
        let find = lookup(vec![condition(1, "or", "", "2,9"), condition(2, "and", "", "1")]);

        let text = describe_condition(find, "1");
        assert_eq!(text, "#1: OR group\n  #2: AND group\n    #1: cycle\n  #9: not found");
        assert_eq!(describe_condition(|_| None, "abc"), "#abc: not found");
    }

    #[test]
    fn test_shared_sub_condition_is_not_a_cycle() {
        let find = lookup(vec![condition(1, "and", "", "2,2"), condition(2, "Equal", "day", "1")]);
        assert_eq!(describe_condition(find, "1"), "#1: AND group\n  #2: day = 1\n  #2: day = 1");
    }

    #[test]
    fn test_unknown_operator_is_rendered_verbatim() {
        let find = lookup(vec![condition(5, "Matches", "name", "^a")]);
        assert_eq!(describe_condition(find, "5"), "#5: name Matches ^a");
    }
}
