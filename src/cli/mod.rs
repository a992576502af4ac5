//! CLI command handling

pub mod output;
pub mod serve;

pub use output::*;
pub use serve::*;
