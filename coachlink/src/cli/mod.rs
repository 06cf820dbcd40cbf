//! CLI argument parsing and command execution.

mod args;
mod commands;

pub use args::{Cli, Commands, ListEntity};
pub use commands::execute;
