pub mod config;
pub mod error;
pub mod expression;
pub mod resolver;
pub mod task;
pub mod wire;

pub use config::Config;
pub use error::*;
pub use expression::*;
pub use resolver::resolve;
pub use task::*;
