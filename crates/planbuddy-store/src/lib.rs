//! Plan data model and single-key local persistence.

pub mod config;
pub mod kv;
pub mod models;
pub mod plan_store;

pub use config::StoreConfig;
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use models::{GeneratedPlan, GeneratedTask, Horizon, Plan, Priority, PriorityFilter, Task};
pub use plan_store::{PLAN_KEY, PlanStore};
