//! Task store and dependency-resolving priority scheduler.

mod ready;
pub mod store;

pub use store::{StoreStats, TaskStore};
