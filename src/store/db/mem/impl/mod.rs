mod condition;
mod flow;
mod task_type;
