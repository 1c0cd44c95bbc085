pub mod log_store;

pub use log_store::ExecutionLogStore;
