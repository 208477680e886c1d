//! Shared utilities

pub mod config;
pub mod fs;
pub mod hash;
pub mod ids;

pub use config::Config;
pub use ids::{IdGenerator, RandomIds};
