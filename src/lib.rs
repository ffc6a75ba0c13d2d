pub mod adapter;
pub mod config;
pub mod error;
pub mod fem;
pub mod harvest;
pub mod kernel;
pub mod math;
pub mod planner;
pub mod registry;
pub mod session;
pub mod structure;
pub mod tasker;

pub use error::{FempartError, Result};
