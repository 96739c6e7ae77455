pub mod config;
pub mod partition;
pub mod todo;
pub mod topic;

pub use config::*;
pub use partition::*;
pub use todo::*;
pub use topic::*;
