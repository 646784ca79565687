mod condition;
mod flow;
mod task_type;

pub use condition::TaskCondition;
pub use flow::TaskFlow;
pub use task_type::TaskType;
