//! CLI command handling

pub mod check_config;
pub mod history;
pub mod notify;
pub mod output;
pub mod send;

pub use check_config::*;
pub use history::*;
pub use notify::*;
pub use output::*;
pub use send::*;
