pub mod admin_operations;

pub use admin_operations::AdminOperations;
