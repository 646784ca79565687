mod edge;
mod flow;
mod hierarchy;
mod node;

pub use edge::TaskEdgeModel;
pub use flow::TaskFlowModel;
pub use hierarchy::Hierarchy;
pub use node::{Constraint, DEFAULT_NODE_KIND, Position, TaskData, TaskMeta, TaskNodeModel, is_blank};
