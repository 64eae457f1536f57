pub mod config;
pub mod context;

pub use config::*;
pub use context::*;
