pub mod args;
pub mod consume_topic;
pub mod model;

pub use args::*;
pub use consume_topic::*;
pub use model::*;
