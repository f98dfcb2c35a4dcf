//! Core types for tasknote: task records, the JSON and vault stores, and the
//! task service that ties them together.

pub mod config;
pub mod json_store;
pub mod migration;
pub mod service;
pub mod store;
pub mod task;
pub mod vault;

pub use service::{Completion, TaskError, TaskService};
pub use store::{StoreError, TaskStore};
pub use task::Task;
