pub mod lock;
pub mod persist;
pub mod project_io;
pub mod recovery;
pub mod storage;
