pub mod calendar;
pub mod derive;
pub mod ids;
pub mod todo_ops;
pub mod topic_ops;
