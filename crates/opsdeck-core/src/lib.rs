pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod param;
pub mod prompt;
pub mod render;
pub mod resolver;
pub mod runner;
pub mod session;
pub mod step;
pub mod task;

pub use error::{OpsError, Result};
